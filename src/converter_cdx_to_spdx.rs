//! Implements the CycloneDX -> SPDX conversion.
//!
//! The SPDX side always gets the fixed `SPDXRef-DOCUMENT` identifier and a
//! freshly generated document namespace. Any CycloneDX serial number is
//! discarded. Every top-level component that carries a `bom-ref` is linked
//! to the document with a `DESCRIBES` relationship.

use crate::cdx_version::DEFAULT_SPDX_VERSION;
use crate::converter::{ConversionPlan, Resolved};
use crate::diagnostics::Diagnostics;
use crate::document::{Object, non_empty_str};
use crate::mapping::{CDX_TO_SPDX, FieldMapping, FieldTransform};
use crate::transformers::identifier::SPDX_DOCUMENT_ID;
use crate::transformers::{
    ComponentsToPackages, DependenciesToRelationships, IdentifierTransformer,
    MetadataToCreationInfo, VersionTransformer,
};
use crate::validation::{CdxValidator, SPDX_DATA_LICENSE, SPDX_REQUIRED_FIELDS, SchemaValidator};
use crate::version_detection::SbomFormat;
use log::debug;
use serde_json::{Value, json};

/// Used when the BOM does not name its subject component.
pub const DEFAULT_DOCUMENT_NAME: &str = "converted-sbom";

pub struct CdxToSpdxConverter {
    validator: CdxValidator,
    metadata: MetadataToCreationInfo,
    packages: ComponentsToPackages,
    relationships: DependenciesToRelationships,
}

impl CdxToSpdxConverter {
    pub fn new(
        metadata: MetadataToCreationInfo,
        packages: ComponentsToPackages,
        relationships: DependenciesToRelationships,
    ) -> Self {
        Self {
            validator: CdxValidator::new(),
            metadata,
            packages,
            relationships,
        }
    }

    fn document_name(source: &Object) -> &str {
        source
            .get("metadata")
            .and_then(|m| m.get("component"))
            .and_then(|c| c.as_object())
            .and_then(|c| non_empty_str(c, "name"))
            .unwrap_or(DEFAULT_DOCUMENT_NAME)
    }
}

impl Default for CdxToSpdxConverter {
    fn default() -> Self {
        Self::new(
            MetadataToCreationInfo::new(),
            ComponentsToPackages::default(),
            DependenciesToRelationships::new(),
        )
    }
}

impl ConversionPlan for CdxToSpdxConverter {
    fn name(&self) -> &'static str {
        "CdxToSpdxConverter"
    }

    fn source(&self) -> SbomFormat {
        SbomFormat::CycloneDx
    }

    fn target(&self) -> SbomFormat {
        SbomFormat::Spdx
    }

    fn validator(&self) -> &dyn SchemaValidator {
        &self.validator
    }

    fn target_required_fields(&self) -> &'static [&'static str] {
        SPDX_REQUIRED_FIELDS
    }

    fn mappings(&self) -> &'static [FieldMapping] {
        CDX_TO_SPDX
    }

    fn initial_skeleton(&self, source: &Object) -> Object {
        let name = Self::document_name(source);
        let mut doc = Object::new();
        doc.insert("spdxVersion".to_string(), json!(DEFAULT_SPDX_VERSION));
        doc.insert("dataLicense".to_string(), json!(SPDX_DATA_LICENSE));
        doc.insert("SPDXID".to_string(), json!(SPDX_DOCUMENT_ID));
        doc.insert("name".to_string(), json!(name));
        doc.insert(
            "documentNamespace".to_string(),
            json!(IdentifierTransformer::document_namespace(name)),
        );
        doc.insert("packages".to_string(), Value::Array(Vec::new()));
        doc.insert("relationships".to_string(), Value::Array(Vec::new()));
        doc
    }

    fn resolve(&self, transform: FieldTransform) -> Resolved<'_> {
        match transform {
            FieldTransform::Version => Resolved::Pure(VersionTransformer::cdx_to_spdx),
            // No CycloneDX field maps onto the SPDX document identifier.
            FieldTransform::Identifier => Resolved::Pure(Value::clone),
            FieldTransform::Metadata => Resolved::Fragment(&self.metadata),
            FieldTransform::Inventory => Resolved::Fragment(&self.packages),
            FieldTransform::Relationships => Resolved::Fragment(&self.relationships),
        }
    }

    fn synthesize(&self, source: &Object, target: &mut Object, diagnostics: &mut Diagnostics) {
        let Some(components) = source.get("components").and_then(|v| v.as_array()) else {
            return;
        };
        let mut describes = DependenciesToRelationships::describes_relationships(components, diagnostics);
        debug!("Synthesized {} DESCRIBES relationships", describes.len());
        if describes.is_empty() {
            return;
        }

        match target.get_mut("relationships") {
            Some(Value::Array(existing)) => {
                describes.append(existing);
                *existing = describes;
            }
            _ => {
                target.insert("relationships".to_string(), Value::Array(describes));
            }
        }
    }
}
