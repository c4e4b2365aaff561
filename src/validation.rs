//! Schema validators for SPDX and CycloneDX documents
//!
//! Validation is advisory: every check yields a human-readable message and
//! nothing is raised. The one exception is the discriminator check, which
//! the converter uses to decide whether a conversion can start at all.

use crate::cdx_version::{SUPPORTED_CDX_VERSIONS, SUPPORTED_SPDX_VERSIONS};
use crate::document::{Document, Object, kind_of};
use crate::errors::ConverterError;
use crate::version_detection::{CDX_BOM_FORMAT, SPDX_VERSION_PREFIX, SbomFormat};
use serde_json::Value;

pub const SPDX_REQUIRED_FIELDS: &[&str] = &[
    "spdxVersion",
    "dataLicense",
    "SPDXID",
    "name",
    "documentNamespace",
];

pub const CDX_REQUIRED_FIELDS: &[&str] = &["bomFormat", "specVersion", "version"];

pub const SPDX_DATA_LICENSE: &str = "CC0-1.0";

/// SPDX 2.3 relationship vocabulary.
pub const SPDX_RELATIONSHIP_TYPES: &[&str] = &[
    "DESCRIBES",
    "DESCRIBED_BY",
    "CONTAINS",
    "CONTAINED_BY",
    "DEPENDS_ON",
    "DEPENDENCY_OF",
    "DEPENDENCY_MANIFEST_OF",
    "BUILD_DEPENDENCY_OF",
    "DEV_DEPENDENCY_OF",
    "OPTIONAL_DEPENDENCY_OF",
    "PROVIDED_DEPENDENCY_OF",
    "TEST_DEPENDENCY_OF",
    "RUNTIME_DEPENDENCY_OF",
    "EXAMPLE_OF",
    "GENERATES",
    "GENERATED_FROM",
    "ANCESTOR_OF",
    "DESCENDANT_OF",
    "VARIANT_OF",
    "DISTRIBUTION_ARTIFACT",
    "PATCH_FOR",
    "PATCH_APPLIED",
    "COPY_OF",
    "FILE_ADDED",
    "FILE_DELETED",
    "FILE_MODIFIED",
    "EXPANDED_FROM_ARCHIVE",
    "DYNAMIC_LINK",
    "STATIC_LINK",
    "DATA_FILE_OF",
    "TEST_CASE_OF",
    "BUILD_TOOL_OF",
    "DEV_TOOL_OF",
    "TEST_OF",
    "TEST_TOOL_OF",
    "DOCUMENTATION_OF",
    "OPTIONAL_COMPONENT_OF",
    "METAFILE_OF",
    "PACKAGE_OF",
    "AMENDS",
    "PREREQUISITE_FOR",
    "HAS_PREREQUISITE",
    "REQUIREMENT_DESCRIPTION_FOR",
    "SPECIFICATION_FOR",
    "OTHER",
];

pub const CDX_COMPONENT_TYPES: &[&str] = &[
    "application",
    "framework",
    "library",
    "container",
    "platform",
    "operating-system",
    "device",
    "device-driver",
    "firmware",
    "file",
    "machine-learning-model",
    "data",
    "cryptographic-asset",
];

/// One validator per schema.
pub trait SchemaValidator: Send + Sync {
    fn format(&self) -> SbomFormat;

    /// Top-level fields a document of this schema must carry.
    fn required_fields(&self) -> &'static [&'static str];

    /// Violation messages; empty when the document is clean.
    fn validate(&self, document: &Document) -> Vec<String>;

    /// Checks the primary discriminator field. `Err` carries the reason a
    /// conversion cannot proceed.
    fn check_discriminator(&self, document: &Document) -> Result<(), String>;

    /// Name of the discriminator field checked by [`Self::check_discriminator`].
    fn discriminator_field(&self) -> &'static str;

    fn validate_and_throw(&self, document: &Document) -> Result<(), ConverterError> {
        let messages = self.validate(document);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ConverterError::Validation(format!(
                "{} document is invalid: {}",
                self.format(),
                messages.join("; ")
            )))
        }
    }
}

fn check_required(obj: &Object, required: &[&str], messages: &mut Vec<String>) {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| !obj.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        messages.push(format!("Missing required fields: {}", missing.join(", ")));
    }
}

/// Iterate `obj[key]` as a list of records, reporting a non-array value.
fn records<'a>(obj: &'a Object, key: &str, messages: &mut Vec<String>) -> &'a [Value] {
    match obj.get(key) {
        None => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            messages.push(format!("{} must be an array, found {}", key, kind_of(other)));
            &[]
        }
    }
}

fn require_string(record: &Object, location: &str, field: &str, messages: &mut Vec<String>) {
    match record.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => messages.push(format!("{}.{} cannot be empty", location, field)),
        Some(other) => messages.push(format!(
            "{}.{} must be a string, found {}",
            location,
            field,
            kind_of(other)
        )),
        None => messages.push(format!("{}: missing required field '{}'", location, field)),
    }
}

/// Validator for SPDX 2.x JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpdxValidator;

impl SpdxValidator {
    pub fn new() -> Self {
        Self
    }

    fn validate_package(pkg: &Value, idx: usize, messages: &mut Vec<String>) {
        let location = format!("packages[{}]", idx);
        let Some(obj) = pkg.as_object() else {
            messages.push(format!("{} must be an object", location));
            return;
        };
        require_string(obj, &location, "name", messages);
        require_string(obj, &location, "SPDXID", messages);

        for (c_idx, checksum) in records(obj, "checksums", messages).iter().enumerate() {
            let ok = checksum
                .as_object()
                .map(|c| c.contains_key("algorithm") && c.contains_key("checksumValue"))
                .unwrap_or(false);
            if !ok {
                messages.push(format!(
                    "{}.checksums[{}] must be an object with algorithm and checksumValue",
                    location, c_idx
                ));
            }
        }
    }

    fn validate_relationship(rel: &Value, idx: usize, messages: &mut Vec<String>) {
        let location = format!("relationships[{}]", idx);
        let Some(obj) = rel.as_object() else {
            messages.push(format!("{} must be an object", location));
            return;
        };
        require_string(obj, &location, "spdxElementId", messages);
        require_string(obj, &location, "relatedSpdxElement", messages);
        match obj.get("relationshipType").and_then(|v| v.as_str()) {
            Some(t) if SPDX_RELATIONSHIP_TYPES.contains(&t) => {}
            Some(t) => messages.push(format!(
                "{}.relationshipType '{}' is not a valid SPDX relationship type",
                location, t
            )),
            None => messages.push(format!(
                "{}: missing required field 'relationshipType'",
                location
            )),
        }
    }
}

impl SchemaValidator for SpdxValidator {
    fn format(&self) -> SbomFormat {
        SbomFormat::Spdx
    }

    fn required_fields(&self) -> &'static [&'static str] {
        SPDX_REQUIRED_FIELDS
    }

    fn discriminator_field(&self) -> &'static str {
        "spdxVersion"
    }

    fn validate(&self, document: &Document) -> Vec<String> {
        let mut messages = Vec::new();
        let Some(obj) = document.as_object() else {
            messages.push("Document root must be an object".to_string());
            return messages;
        };

        check_required(obj, SPDX_REQUIRED_FIELDS, &mut messages);

        if let Some(version) = obj.get("spdxVersion").and_then(|v| v.as_str())
            && !SUPPORTED_SPDX_VERSIONS.contains(&version)
        {
            messages.push(format!(
                "Unsupported spdxVersion '{}', expected one of: {}",
                version,
                SUPPORTED_SPDX_VERSIONS.join(", ")
            ));
        }

        if let Some(license) = obj.get("dataLicense")
            && license.as_str() != Some(SPDX_DATA_LICENSE)
        {
            messages.push(format!(
                "dataLicense must be '{}', found {}",
                SPDX_DATA_LICENSE, license
            ));
        }

        for (idx, pkg) in records(obj, "packages", &mut messages).iter().enumerate() {
            Self::validate_package(pkg, idx, &mut messages);
        }

        for (idx, rel) in records(obj, "relationships", &mut messages).iter().enumerate() {
            Self::validate_relationship(rel, idx, &mut messages);
        }

        messages
    }

    fn check_discriminator(&self, document: &Document) -> Result<(), String> {
        match document.get("spdxVersion") {
            None => Err("Missing required field: spdxVersion".to_string()),
            Some(Value::String(v)) if v.starts_with(SPDX_VERSION_PREFIX) => Ok(()),
            Some(Value::String(v)) => Err(format!(
                "Invalid spdxVersion: '{}', expected a value starting with '{}'",
                v, SPDX_VERSION_PREFIX
            )),
            Some(other) => Err(format!("spdxVersion must be a string, found {}", kind_of(other))),
        }
    }
}

/// Validator for CycloneDX JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdxValidator;

impl CdxValidator {
    pub fn new() -> Self {
        Self
    }

    fn validate_component(comp: &Value, idx: usize, messages: &mut Vec<String>) {
        let location = format!("components[{}]", idx);
        let Some(obj) = comp.as_object() else {
            messages.push(format!("{} must be an object", location));
            return;
        };

        require_string(obj, &location, "name", messages);

        if let Some(comp_type) = obj.get("type") {
            match comp_type.as_str() {
                Some(t) if CDX_COMPONENT_TYPES.contains(&t) => {}
                _ => messages.push(format!(
                    "{}.type {} is not a valid component type. Valid types: {}",
                    location,
                    comp_type,
                    CDX_COMPONENT_TYPES.join(", ")
                )),
            }
        }

        for (l_idx, choice) in records(obj, "licenses", messages).iter().enumerate() {
            let valid = match choice.as_object() {
                Some(c) => {
                    c.get("expression").map(|e| e.is_string()).unwrap_or(false)
                        || c.get("license")
                            .and_then(|l| l.as_object())
                            .map(|l| l.contains_key("id") || l.contains_key("name"))
                            .unwrap_or(false)
                }
                None => false,
            };
            if !valid {
                messages.push(format!(
                    "{}.licenses[{}] must be an object with a license id/name or an expression",
                    location, l_idx
                ));
            }
        }
    }
}

impl SchemaValidator for CdxValidator {
    fn format(&self) -> SbomFormat {
        SbomFormat::CycloneDx
    }

    fn required_fields(&self) -> &'static [&'static str] {
        CDX_REQUIRED_FIELDS
    }

    fn discriminator_field(&self) -> &'static str {
        "bomFormat"
    }

    fn validate(&self, document: &Document) -> Vec<String> {
        let mut messages = Vec::new();
        let Some(obj) = document.as_object() else {
            messages.push("Document root must be an object".to_string());
            return messages;
        };

        check_required(obj, CDX_REQUIRED_FIELDS, &mut messages);

        if let Some(format) = obj.get("bomFormat")
            && format.as_str() != Some(CDX_BOM_FORMAT)
        {
            messages.push(format!(
                "Invalid bomFormat: {}, expected '{}'",
                format, CDX_BOM_FORMAT
            ));
        }

        if let Some(spec_version) = obj.get("specVersion") {
            match spec_version.as_str() {
                Some(v) if SUPPORTED_CDX_VERSIONS.contains(&v) => {}
                _ => messages.push(format!(
                    "Unsupported specVersion {}, expected one of: {}",
                    spec_version,
                    SUPPORTED_CDX_VERSIONS.join(", ")
                )),
            }
        }

        if let Some(version) = obj.get("version")
            && !(version.is_u64() || version.is_i64())
        {
            messages.push(format!("version must be an integer, found {}", version));
        }

        for (idx, comp) in records(obj, "components", &mut messages).iter().enumerate() {
            Self::validate_component(comp, idx, &mut messages);
        }

        for (idx, dep) in records(obj, "dependencies", &mut messages).iter().enumerate() {
            match dep.as_object() {
                Some(d) => require_string(d, &format!("dependencies[{}]", idx), "ref", &mut messages),
                None => messages.push(format!("dependencies[{}] must be an object", idx)),
            }
        }

        messages
    }

    fn check_discriminator(&self, document: &Document) -> Result<(), String> {
        match document.get("bomFormat") {
            None => Err("Missing required field: bomFormat".to_string()),
            Some(Value::String(v)) if v == CDX_BOM_FORMAT => Ok(()),
            Some(other) => Err(format!(
                "Invalid bomFormat: {}, expected '{}'",
                other, CDX_BOM_FORMAT
            )),
        }
    }
}
