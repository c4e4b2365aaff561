//! Inventory records: SPDX `packages` <-> CycloneDX `components`.

use super::identifier::{IdentifierTransformer, SpdxIdMap};
use super::{FragmentTransformer, HashTransformer, LicenseTransformer, expect_array, is_no_assertion};
use crate::diagnostics::Diagnostics;
use crate::document::{Object, kind_of, non_empty_str};
use crate::errors::TransformError;
use serde_json::{Value, json};

/// (SPDX primaryPackagePurpose, CycloneDX component type)
const PURPOSES: &[(&str, &str)] = &[
    ("APPLICATION", "application"),
    ("FRAMEWORK", "framework"),
    ("LIBRARY", "library"),
    ("CONTAINER", "container"),
    ("OPERATING-SYSTEM", "operating-system"),
    ("DEVICE", "device"),
    ("FIRMWARE", "firmware"),
    ("FILE", "file"),
];

const DEFAULT_COMPONENT_TYPE: &str = "library";

const FALLBACK_NAME: &str = "unknown";

/// `Organization: Acme` / `Person: Jane` -> `Acme` / `Jane`
fn actor_name(raw: &str) -> Option<&str> {
    if is_no_assertion(raw) {
        return None;
    }
    let name = raw.split_once(':').map(|(_, n)| n).unwrap_or(raw).trim();
    let name = match name.rfind('(') {
        Some(idx) if name.ends_with(')') => name[..idx].trim(),
        _ => name,
    };
    (!name.is_empty()).then_some(name)
}

fn external_ref_locator<'a>(package: &'a Object, reference_types: &[&str]) -> Option<&'a str> {
    package
        .get("externalRefs")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .find(|r| {
            r.get("referenceType")
                .and_then(|t| t.as_str())
                .map(|t| reference_types.contains(&t))
                .unwrap_or(false)
        })
        .and_then(|r| r.get("referenceLocator"))
        .and_then(|v| v.as_str())
}

fn generic_purl(name: &str, version: Option<&str>, qualifier: &str, value: &str) -> String {
    let mut purl = format!("pkg:generic/{}", urlencoding::encode(name));
    if let Some(version) = version {
        purl.push('@');
        purl.push_str(&urlencoding::encode(version));
    }
    purl.push('?');
    purl.push_str(qualifier);
    purl.push('=');
    purl.push_str(&urlencoding::encode(value));
    purl
}

/// SPDX `packages` -> CycloneDX `components`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackagesToComponents {
    licenses: LicenseTransformer,
    hashes: HashTransformer,
}

impl PackagesToComponents {
    pub fn new(licenses: LicenseTransformer, hashes: HashTransformer) -> Self {
        Self { licenses, hashes }
    }

    /// Package-manager locator: an explicit purl reference, else one
    /// derived from the download location, else from the file name.
    fn purl(package: &Object, name: &str, version: Option<&str>) -> Option<String> {
        if let Some(purl) = external_ref_locator(package, &["purl"]) {
            return Some(purl.to_string());
        }
        if let Some(location) = non_empty_str(package, "downloadLocation")
            && !is_no_assertion(location)
        {
            return Some(generic_purl(name, version, "download_url", location));
        }
        non_empty_str(package, "packageFileName")
            .map(|file| generic_purl(name, version, "file_name", file))
    }

    fn convert_package(&self, package: &Object, diagnostics: &mut Diagnostics) -> Value {
        let name = match non_empty_str(package, "name") {
            Some(name) => name,
            None => {
                diagnostics.warn("SPDX package without a name, using 'unknown'");
                FALLBACK_NAME
            }
        };
        let version = non_empty_str(package, "versionInfo");

        let mut component = Object::new();

        let component_type = non_empty_str(package, "primaryPackagePurpose")
            .and_then(|purpose| PURPOSES.iter().find(|(spdx, _)| *spdx == purpose))
            .map(|(_, cdx)| *cdx)
            .unwrap_or(DEFAULT_COMPONENT_TYPE);
        component.insert("type".to_string(), json!(component_type));

        let bom_ref = match non_empty_str(package, "SPDXID") {
            Some(id) => IdentifierTransformer::bom_ref_from_spdx_id(id),
            None => IdentifierTransformer::generate("component", name),
        };
        component.insert("bom-ref".to_string(), json!(bom_ref));

        if let Some(supplier) = non_empty_str(package, "supplier").and_then(actor_name) {
            component.insert("supplier".to_string(), json!({ "name": supplier }));
        }

        component.insert("name".to_string(), json!(name));
        if let Some(version) = version {
            component.insert("version".to_string(), json!(version));
        }

        let description = non_empty_str(package, "description")
            .or_else(|| non_empty_str(package, "summary"));
        if let Some(description) = description {
            component.insert("description".to_string(), json!(description));
        }

        if let Some(checksums) = package.get("checksums").and_then(|v| v.as_array()) {
            let hashes = self.hashes.checksums_to_hashes(checksums, name, diagnostics);
            if !hashes.is_empty() {
                component.insert("hashes".to_string(), Value::Array(hashes));
            }
        }

        match self.licenses.reconcile_spdx(package) {
            Some(expression) => {
                component.insert(
                    "licenses".to_string(),
                    Value::Array(self.licenses.expression_to_cdx(expression)),
                );
            }
            None => diagnostics.warn(format!(
                "Package '{}' has no license in licenseConcluded or licenseDeclared",
                name
            )),
        }

        if let Some(cpe) = external_ref_locator(package, &["cpe23Type", "cpe22Type"]) {
            component.insert("cpe".to_string(), json!(cpe));
        }

        if let Some(purl) = Self::purl(package, name, version) {
            component.insert("purl".to_string(), json!(purl));
        }

        if let Some(location) = non_empty_str(package, "downloadLocation")
            && !is_no_assertion(location)
        {
            component.insert(
                "externalReferences".to_string(),
                json!([{ "type": "distribution", "url": location }]),
            );
        }

        Value::Object(component)
    }
}

impl FragmentTransformer for PackagesToComponents {
    fn name(&self) -> &'static str {
        "PackageTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let packages = expect_array(fragment)?;
        let mut components = Vec::with_capacity(packages.len());
        for (idx, package) in packages.iter().enumerate() {
            match package.as_object() {
                Some(obj) => components.push(self.convert_package(obj, diagnostics)),
                None => diagnostics.warn(format!(
                    "Skipping packages[{}]: expected an object, found {}",
                    idx,
                    kind_of(package)
                )),
            }
        }
        Ok(Value::Array(components))
    }
}

/// CycloneDX `components` -> SPDX `packages`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentsToPackages {
    licenses: LicenseTransformer,
    hashes: HashTransformer,
}

impl ComponentsToPackages {
    pub fn new(licenses: LicenseTransformer, hashes: HashTransformer) -> Self {
        Self { licenses, hashes }
    }

    fn distribution_url(component: &Object) -> Option<&str> {
        component
            .get("externalReferences")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .find(|r| r.get("type").and_then(|t| t.as_str()) == Some("distribution"))
            .and_then(|r| r.get("url"))
            .and_then(|v| v.as_str())
    }

    fn convert_component(
        &self,
        component: &Object,
        spdx_id: Option<&str>,
        ids: &mut SpdxIdMap,
        diagnostics: &mut Diagnostics,
    ) -> Value {
        let name = match non_empty_str(component, "name") {
            Some(name) => name,
            None => {
                diagnostics.warn("CycloneDX component without a name, using 'unknown'");
                FALLBACK_NAME
            }
        };

        let mut package = Object::new();

        let spdx_id = match spdx_id {
            Some(id) => id.to_string(),
            None => ids.generate(name),
        };
        package.insert("SPDXID".to_string(), json!(spdx_id));
        package.insert("name".to_string(), json!(name));

        if let Some(version) = non_empty_str(component, "version") {
            package.insert("versionInfo".to_string(), json!(version));
        }

        if let Some(supplier) = component
            .get("supplier")
            .and_then(|s| s.get("name"))
            .and_then(|v| v.as_str())
        {
            package.insert("supplier".to_string(), json!(format!("Organization: {}", supplier)));
        }

        let download = Self::distribution_url(component).unwrap_or("NOASSERTION");
        package.insert("downloadLocation".to_string(), json!(download));
        package.insert("filesAnalyzed".to_string(), json!(false));

        if let Some(hashes) = component.get("hashes").and_then(|v| v.as_array()) {
            let checksums = self.hashes.hashes_to_checksums(hashes, name, diagnostics);
            if !checksums.is_empty() {
                package.insert("checksums".to_string(), Value::Array(checksums));
            }
        }

        let licenses = component.get("licenses").and_then(|v| v.as_array());
        match licenses.and_then(|l| self.licenses.cdx_to_expression(l)) {
            Some(expression) => {
                package.insert("licenseConcluded".to_string(), json!(expression));
                package.insert("licenseDeclared".to_string(), json!(expression));
            }
            None => diagnostics.warn(format!("Component '{}' has no usable license", name)),
        }

        if let Some(description) = non_empty_str(component, "description") {
            package.insert("description".to_string(), json!(description));
        }

        if let Some(component_type) = non_empty_str(component, "type") {
            let purpose = PURPOSES
                .iter()
                .find(|(_, cdx)| *cdx == component_type)
                .map(|(spdx, _)| *spdx)
                .unwrap_or("OTHER");
            package.insert("primaryPackagePurpose".to_string(), json!(purpose));
        }

        let mut external_refs = Vec::new();
        if let Some(purl) = non_empty_str(component, "purl") {
            external_refs.push(json!({
                "referenceCategory": "PACKAGE-MANAGER",
                "referenceType": "purl",
                "referenceLocator": purl
            }));
        }
        if let Some(cpe) = non_empty_str(component, "cpe") {
            external_refs.push(json!({
                "referenceCategory": "SECURITY",
                "referenceType": "cpe23Type",
                "referenceLocator": cpe
            }));
        }
        if !external_refs.is_empty() {
            package.insert("externalRefs".to_string(), Value::Array(external_refs));
        }

        if component
            .get("components")
            .and_then(|v| v.as_array())
            .is_some_and(|nested| !nested.is_empty())
        {
            diagnostics.warn(format!("Nested components of '{}' are not converted", name));
        }

        Value::Object(package)
    }
}

impl FragmentTransformer for ComponentsToPackages {
    fn name(&self) -> &'static str {
        "PackageTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let components = expect_array(fragment)?;
        let mut ids = SpdxIdMap::from_components(components);
        for (bom_ref, id) in ids.renamed() {
            diagnostics.warn(format!(
                "bom-ref '{}' collides with an existing SPDX identifier, renamed to '{}'",
                bom_ref, id
            ));
        }

        let mut packages = Vec::with_capacity(components.len());
        for (idx, component) in components.iter().enumerate() {
            match component.as_object() {
                Some(obj) => {
                    let spdx_id = ids.for_index(idx).map(str::to_string);
                    packages.push(self.convert_component(obj, spdx_id.as_deref(), &mut ids, diagnostics));
                }
                None => diagnostics.warn(format!(
                    "Skipping components[{}]: expected an object, found {}",
                    idx,
                    kind_of(component)
                )),
            }
        }
        Ok(Value::Array(packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn to_cdx(packages: Value) -> (Value, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let out = PackagesToComponents::default()
            .transform(&packages, &mut diagnostics)
            .unwrap();
        (out, diagnostics)
    }

    fn to_spdx(components: Value) -> (Value, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let out = ComponentsToPackages::default()
            .transform(&components, &mut diagnostics)
            .unwrap();
        (out, diagnostics)
    }

    #[test]
    fn test_package_to_component_full() {
        let (components, diagnostics) = to_cdx(json!([{
            "SPDXID": "SPDXRef-Package-left-pad",
            "name": "left-pad",
            "versionInfo": "1.3.0",
            "supplier": "Organization: npm (ops@npmjs.com)",
            "summary": "Pads strings",
            "primaryPackagePurpose": "LIBRARY",
            "downloadLocation": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz",
            "licenseConcluded": "NOASSERTION",
            "licenseDeclared": "WTFPL",
            "checksums": [{"algorithm": "SHA1", "checksumValue": "5b8a3f7c"}],
            "externalRefs": [
                {"referenceCategory": "SECURITY", "referenceType": "cpe23Type",
                 "referenceLocator": "cpe:2.3:a:left-pad:left-pad:1.3.0:*:*:*:*:*:*:*"},
                {"referenceCategory": "PACKAGE-MANAGER", "referenceType": "purl",
                 "referenceLocator": "pkg:npm/left-pad@1.3.0"}
            ]
        }]));

        assert_eq!(
            components,
            json!([{
                "type": "library",
                "bom-ref": "Package-left-pad",
                "supplier": {"name": "npm"},
                "name": "left-pad",
                "version": "1.3.0",
                "description": "Pads strings",
                "hashes": [{"alg": "SHA-1", "content": "5b8a3f7c"}],
                "licenses": [{"license": {"id": "WTFPL"}}],
                "cpe": "cpe:2.3:a:left-pad:left-pad:1.3.0:*:*:*:*:*:*:*",
                "purl": "pkg:npm/left-pad@1.3.0",
                "externalReferences": [{
                    "type": "distribution",
                    "url": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz"
                }]
            }])
        );
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_missing_license_warns_once_and_omits_field() {
        let (components, diagnostics) = to_cdx(json!([{"SPDXID": "SPDXRef-a", "name": "a"}]));

        assert_eq!(components, json!([{"type": "library", "bom-ref": "a", "name": "a"}]));
        assert_eq!(diagnostics.warnings().len(), 1);
        assert!(diagnostics.warnings()[0].contains("'a'"));
    }

    #[test]
    fn test_purl_derived_from_download_location_then_file_name() {
        let (components, _) = to_cdx(json!([
            {"SPDXID": "SPDXRef-a", "name": "a", "versionInfo": "1.0",
             "downloadLocation": "https://example.com/a.tgz", "packageFileName": "a.tgz"},
            {"SPDXID": "SPDXRef-b", "name": "b", "downloadLocation": "NOASSERTION",
             "packageFileName": "b 1.zip"}
        ]));

        assert_eq!(
            components[0]["purl"],
            json!("pkg:generic/a@1.0?download_url=https%3A%2F%2Fexample.com%2Fa.tgz")
        );
        assert_eq!(components[1]["purl"], json!("pkg:generic/b?file_name=b%201.zip"));
        assert!(components[1].get("externalReferences").is_none());
    }

    #[test]
    fn test_package_without_identifier_gets_generated_ref() {
        let (components, _) = to_cdx(json!([{"name": "nameless id", "licenseDeclared": "MIT"}]));
        let bom_ref = components[0]["bom-ref"].as_str().unwrap();
        assert!(bom_ref.starts_with("component-nameless-id-"));
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let (components, diagnostics) = to_cdx(json!([42, {"SPDXID": "SPDXRef-a", "name": "a", "licenseDeclared": "MIT"}]));
        assert_eq!(components.as_array().unwrap().len(), 1);
        assert_eq!(
            diagnostics.warnings(),
            ["Skipping packages[0]: expected an object, found a number".to_string()]
        );
    }

    #[test]
    fn test_packages_must_be_array() {
        let mut diagnostics = Diagnostics::new();
        let err = PackagesToComponents::default()
            .transform(&json!({"name": "x"}), &mut diagnostics)
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::UnexpectedShape { expected: "an array", found: "an object" }
        );
    }

    #[test]
    fn test_component_to_package_full() {
        let (packages, diagnostics) = to_spdx(json!([{
            "type": "framework",
            "bom-ref": "pkg:maven/org.acme/core@2.1.0",
            "supplier": {"name": "Acme"},
            "name": "core",
            "version": "2.1.0",
            "description": "Core framework",
            "hashes": [{"alg": "SHA-256", "content": "abcd"}],
            "licenses": [{"license": {"id": "Apache-2.0"}}],
            "purl": "pkg:maven/org.acme/core@2.1.0",
            "cpe": "cpe:2.3:a:acme:core:2.1.0:*:*:*:*:*:*:*",
            "externalReferences": [{"type": "distribution", "url": "https://repo.acme.org/core.jar"}]
        }]));

        assert_eq!(
            packages,
            json!([{
                "SPDXID": "SPDXRef-pkg-maven-org.acme-core-2.1.0",
                "name": "core",
                "versionInfo": "2.1.0",
                "supplier": "Organization: Acme",
                "downloadLocation": "https://repo.acme.org/core.jar",
                "filesAnalyzed": false,
                "checksums": [{"algorithm": "SHA256", "checksumValue": "abcd"}],
                "licenseConcluded": "Apache-2.0",
                "licenseDeclared": "Apache-2.0",
                "description": "Core framework",
                "primaryPackagePurpose": "FRAMEWORK",
                "externalRefs": [
                    {"referenceCategory": "PACKAGE-MANAGER", "referenceType": "purl",
                     "referenceLocator": "pkg:maven/org.acme/core@2.1.0"},
                    {"referenceCategory": "SECURITY", "referenceType": "cpe23Type",
                     "referenceLocator": "cpe:2.3:a:acme:core:2.1.0:*:*:*:*:*:*:*"}
                ]
            }])
        );
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_component_without_license_or_ref() {
        let (packages, diagnostics) = to_spdx(json!([{"type": "data", "name": "dataset"}]));

        assert!(packages[0]["SPDXID"].as_str().unwrap().starts_with("SPDXRef-Package-dataset-"));
        assert_eq!(packages[0]["downloadLocation"], json!("NOASSERTION"));
        assert_eq!(packages[0]["primaryPackagePurpose"], json!("OTHER"));
        assert!(packages[0].get("licenseConcluded").is_none());
        assert_eq!(
            diagnostics.warnings(),
            ["Component 'dataset' has no usable license".to_string()]
        );
    }

    #[test]
    fn test_colliding_bom_refs_get_distinct_spdx_ids() {
        let (packages, diagnostics) = to_spdx(json!([
            {"bom-ref": "a b", "name": "first", "licenses": [{"license": {"id": "MIT"}}]},
            {"bom-ref": "a_b", "name": "second", "licenses": [{"license": {"id": "MIT"}}]},
            {"bom-ref": "DOCUMENT", "name": "third", "licenses": [{"license": {"id": "MIT"}}]}
        ]));

        let ids: Vec<_> = packages
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["SPDXID"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["SPDXRef-a-b", "SPDXRef-a-b-2", "SPDXRef-DOCUMENT-2"]);
        assert_eq!(
            diagnostics.warnings(),
            [
                "bom-ref 'a_b' collides with an existing SPDX identifier, renamed to 'SPDXRef-a-b-2'"
                    .to_string(),
                "bom-ref 'DOCUMENT' collides with an existing SPDX identifier, renamed to 'SPDXRef-DOCUMENT-2'"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_actor_name() {
        assert_eq!(actor_name("Organization: Acme Corp"), Some("Acme Corp"));
        assert_eq!(actor_name("Person: Jane (jane@x.org)"), Some("Jane"));
        assert_eq!(actor_name("NOASSERTION"), None);
    }
}
