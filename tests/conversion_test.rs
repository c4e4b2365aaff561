//! End-to-end conversion tests through the public library API.

use pretty_assertions::assert_eq;
use sbom_bridge::converter_cdx_to_spdx::CdxToSpdxConverter;
use sbom_bridge::converter_spdx_to_cdx::SpdxToCdxConverter;
use sbom_bridge::{Converter, ConverterError, ConverterFactory, SbomFormat, Severity};
use serde_json::{Value, json};

// --- Helper Functions ---

fn minimal_spdx() -> Value {
    json!({
        "spdxVersion": "SPDX-2.3",
        "dataLicense": "CC0-1.0",
        "SPDXID": "SPDXRef-DOCUMENT",
        "name": "x",
        "documentNamespace": "ns"
    })
}

fn minimal_cdx() -> Value {
    json!({"bomFormat": "CycloneDX", "specVersion": "1.4", "version": 1})
}

fn to_spdx(input: &Value) -> Result<sbom_bridge::ConversionResult, ConverterError> {
    CdxToSpdxConverter::default().convert(&input.to_string())
}

fn to_cdx(input: &Value) -> Result<sbom_bridge::ConversionResult, ConverterError> {
    SpdxToCdxConverter::default().convert(&input.to_string())
}

fn parse(content: &str) -> Value {
    serde_json::from_str(content).unwrap()
}

// --- Scenarios ---

#[test]
fn test_minimal_cdx_to_spdx() {
    let result = to_spdx(&minimal_cdx()).unwrap();
    assert!(result.success(), "{}", result.format_plain());
    assert_eq!(result.target_format(), SbomFormat::Spdx);

    let doc = parse(result.content());
    assert_eq!(doc["SPDXID"], json!("SPDXRef-DOCUMENT"));
    assert_eq!(doc["spdxVersion"], json!("SPDX-2.3"));
    assert_eq!(doc["dataLicense"], json!("CC0-1.0"));
    assert!(
        doc["documentNamespace"]
            .as_str()
            .unwrap()
            .starts_with("https://spdx.org/spdxdocs/")
    );
    assert_eq!(doc["packages"], json!([]));
    assert!(doc["creationInfo"]["created"].is_string());
    assert_eq!(doc["creationInfo"]["creators"].as_array().unwrap().len(), 1);
}

#[test]
fn test_minimal_spdx_to_cdx() {
    let result = to_cdx(&minimal_spdx()).unwrap();
    assert!(result.success(), "{}", result.format_plain());

    let bom = parse(result.content());
    assert_eq!(bom["bomFormat"], json!("CycloneDX"));
    assert_eq!(bom["specVersion"], json!("1.5"));
    assert_eq!(bom["components"], json!([]));
    assert_eq!(bom["version"], json!(1));
    assert!(bom["serialNumber"].as_str().unwrap().starts_with("urn:uuid:"));
    assert!(bom["metadata"]["timestamp"].is_string());
}

#[test]
fn test_bad_marker_aborts_with_one_critical() {
    let err = to_spdx(&json!({"bomFormat": "NotCycloneDX"})).err().unwrap();

    assert!(matches!(
        err,
        ConverterError::Aborted {
            source_format: SbomFormat::CycloneDx,
            target_format: SbomFormat::Spdx,
            ..
        }
    ));
    let critical: Vec<_> = err
        .errors()
        .iter()
        .filter(|e| e.severity() == Severity::Critical)
        .collect();
    assert_eq!(critical.len(), 1);
    assert!(critical[0].message().contains("NotCycloneDX"));
    assert!(critical[0].message().contains("bomFormat"));
}

#[test]
fn test_missing_discriminator_aborts() {
    let mut doc = minimal_spdx();
    doc.as_object_mut().unwrap().remove("spdxVersion");

    let err = to_cdx(&doc).err().unwrap();
    let critical: Vec<_> = err
        .errors()
        .iter()
        .filter(|e| e.severity() == Severity::Critical)
        .collect();
    assert_eq!(critical.len(), 1);
    assert!(critical[0].message().contains("spdxVersion"));
}

#[test]
fn test_malformed_text_aborts() {
    let err = CdxToSpdxConverter::default().convert("{\"bomFormat\": ").err().unwrap();
    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].code(), Some("DECODE_FAILED"));
}

#[test]
fn test_component_without_license() {
    let mut bom = minimal_cdx();
    bom["components"] = json!([{"type": "library", "bom-ref": "nolic", "name": "nolic", "version": "1.0"}]);

    let result = to_spdx(&bom).unwrap();
    assert!(result.success());

    let doc = parse(result.content());
    let packages = doc["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert!(packages[0].get("licenseConcluded").is_none());
    assert!(packages[0].get("licenseDeclared").is_none());

    let license_warnings: Vec<_> = result
        .warnings()
        .iter()
        .filter(|w| w.contains("license"))
        .collect();
    assert_eq!(license_warnings.len(), 1);
    assert!(license_warnings[0].contains("nolic"));
}

#[test]
fn test_package_without_license() {
    let mut doc = minimal_spdx();
    doc["packages"] = json!([{"SPDXID": "SPDXRef-p", "name": "p", "licenseConcluded": "NOASSERTION"}]);

    let result = to_cdx(&doc).unwrap();
    let bom = parse(result.content());
    assert!(bom["components"][0].get("licenses").is_none());
    assert_eq!(
        result.warnings(),
        ["Package 'p' has no license in licenseConcluded or licenseDeclared".to_string()]
    );
}

// --- Properties ---

#[test]
fn test_unknown_fields_warn_exactly_once() {
    let mut bom = minimal_cdx();
    bom["x-vendor"] = json!({"a": 1});
    bom["bogus"] = json!(true);

    let result = to_spdx(&bom).unwrap();
    for key in ["x-vendor", "bogus"] {
        let expected = format!("Unknown or unmapped CycloneDX field: {}", key);
        assert_eq!(result.warnings().iter().filter(|w| **w == expected).count(), 1);
    }
    assert_eq!(
        result
            .warnings()
            .iter()
            .filter(|w| w.starts_with("Unknown or unmapped"))
            .count(),
        2
    );

    let mut doc = minimal_spdx();
    doc["reviewers"] = json!([]);
    let result = to_cdx(&doc).unwrap();
    assert_eq!(result.warnings(), ["Unknown or unmapped SPDX field: reviewers".to_string()]);
}

#[test]
fn test_known_but_dropped_fields_do_not_warn() {
    let mut bom = minimal_cdx();
    bom["serialNumber"] = json!("urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79");
    bom["services"] = json!([]);

    let result = to_spdx(&bom).unwrap();
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());
}

#[test]
fn test_describes_edges_match_identified_components() {
    let mut bom = minimal_cdx();
    bom["components"] = json!([
        {"type": "library", "bom-ref": "a", "name": "a", "licenses": [{"license": {"id": "MIT"}}]},
        {"type": "library", "name": "b", "licenses": [{"license": {"id": "MIT"}}]},
        {"type": "library", "bom-ref": "c", "name": "c", "licenses": [{"license": {"id": "MIT"}}]},
        {"type": "library", "name": "d", "licenses": [{"license": {"id": "MIT"}}]},
        "not-a-component"
    ]);

    let result = to_spdx(&bom).unwrap();
    let doc = parse(result.content());
    let describes = doc["relationships"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["relationshipType"] == json!("DESCRIBES"))
        .count();
    assert_eq!(describes, 2);

    let missing = result
        .warnings()
        .iter()
        .filter(|w| w.ends_with("missing identifier, cannot create relationship"))
        .count();
    assert_eq!(missing, 3);
}

#[test]
fn test_missing_required_source_field_warns_and_keeps_skeleton_value() {
    let bom = json!({"bomFormat": "CycloneDX", "version": 1});

    let result = to_spdx(&bom).unwrap();
    assert!(
        result
            .warnings()
            .contains(&"Missing required field 'specVersion' for target field 'spdxVersion'".to_string()),
        "{:?}",
        result.warnings()
    );
    // The CycloneDX validator reports the missing field as well.
    assert!(!result.success());

    let doc = parse(result.content());
    assert_eq!(doc["spdxVersion"], json!("SPDX-2.3"));
}

#[test]
fn test_colliding_bom_refs_produce_unique_spdx_ids() {
    let mut bom = minimal_cdx();
    bom["components"] = json!([
        {"type": "library", "bom-ref": "a b", "name": "x", "licenses": [{"license": {"id": "MIT"}}]},
        {"type": "library", "bom-ref": "a_b", "name": "y", "licenses": [{"license": {"id": "MIT"}}]},
        {"type": "library", "bom-ref": "DOCUMENT", "name": "z", "licenses": [{"license": {"id": "MIT"}}]}
    ]);

    let result = to_spdx(&bom).unwrap();
    let doc = parse(result.content());
    let mut ids: Vec<_> = doc["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["SPDXID"].as_str().unwrap().to_string())
        .collect();
    assert!(!ids.contains(&"SPDXRef-DOCUMENT".to_string()));
    ids.push("SPDXRef-DOCUMENT".to_string());
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);

    let self_describing = doc["relationships"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["spdxElementId"] == r["relatedSpdxElement"]);
    assert!(!self_describing);
    assert_eq!(
        result
            .warnings()
            .iter()
            .filter(|w| w.contains("renamed to"))
            .count(),
        2
    );
}

#[test]
fn test_default_fill_is_idempotent() {
    let first = parse(to_spdx(&minimal_cdx()).unwrap().content());
    let second = parse(to_spdx(&minimal_cdx()).unwrap().content());

    let strip = |mut doc: Value| {
        let obj = doc.as_object_mut().unwrap();
        obj.remove("documentNamespace");
        obj["creationInfo"].as_object_mut().unwrap().remove("created");
        doc
    };
    assert_eq!(strip(first), strip(second));

    let first = parse(to_cdx(&minimal_spdx()).unwrap().content());
    let second = parse(to_cdx(&minimal_spdx()).unwrap().content());
    let strip = |mut doc: Value| {
        doc["metadata"].as_object_mut().unwrap().remove("timestamp");
        doc
    };
    // Same namespace, same serial number.
    assert_eq!(strip(first), strip(second));
}

#[test]
fn test_schema_violations_are_errors_but_not_fatal() {
    let mut doc = minimal_spdx();
    doc["dataLicense"] = json!("MIT");
    doc["packages"] = json!("not-a-list");

    let result = to_cdx(&doc).unwrap();
    assert!(!result.success());
    assert!(
        result
            .errors()
            .iter()
            .any(|e| e.code() == Some("SCHEMA_VIOLATION") && e.message().contains("dataLicense"))
    );
    let failure = result
        .errors()
        .iter()
        .find(|e| e.code() == Some("TRANSFORM_FAILED"))
        .unwrap();
    assert_eq!(failure.component(), "PackageTransformer");

    let bom = parse(result.content());
    assert!(bom.get("components").is_none());
    assert_eq!(bom["bomFormat"], json!("CycloneDX"));
}

#[test]
fn test_transform_failure_on_metadata_falls_back_to_default() {
    let mut bom = minimal_cdx();
    bom["metadata"] = json!("yesterday");

    let result = to_spdx(&bom).unwrap();
    assert!(!result.success());
    let doc = parse(result.content());
    assert!(doc["creationInfo"]["created"].is_string());
}

#[test]
fn test_relationship_vocabulary_round_trip() {
    let mut doc = minimal_spdx();
    doc["packages"] = json!([
        {"SPDXID": "SPDXRef-app", "name": "app", "licenseConcluded": "MIT"},
        {"SPDXID": "SPDXRef-lib", "name": "lib", "licenseConcluded": "MIT"},
        {"SPDXID": "SPDXRef-devtool", "name": "devtool", "licenseConcluded": "MIT"}
    ]);
    doc["relationships"] = json!([
        {"spdxElementId": "SPDXRef-app", "relationshipType": "DEPENDS_ON", "relatedSpdxElement": "SPDXRef-lib"},
        {"spdxElementId": "SPDXRef-devtool", "relationshipType": "DEV_DEPENDENCY_OF", "relatedSpdxElement": "SPDXRef-app"},
        {"spdxElementId": "SPDXRef-lib", "relationshipType": "GENERATED_FROM", "relatedSpdxElement": "SPDXRef-app"}
    ]);

    let result = to_cdx(&doc).unwrap();
    assert!(result.success(), "{}", result.format_plain());
    let bom = parse(result.content());
    assert_eq!(
        bom["dependencies"],
        json!([
            {"ref": "app", "dependsOn": ["lib", "devtool"]},
            {"ref": "lib", "dependsOn": ["app"]}
        ])
    );
    assert_eq!(
        result
            .warnings()
            .iter()
            .filter(|w| w.contains("'GENERATED_FROM'"))
            .count(),
        1
    );

    let back = to_spdx(&bom).unwrap();
    let spdx = parse(back.content());
    let depends_on = spdx["relationships"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["relationshipType"] == json!("DEPENDS_ON"))
        .count();
    assert_eq!(depends_on, 3);
}

#[test]
fn test_factory_round_trip() {
    let factory = ConverterFactory::new();
    let input = minimal_spdx().to_string();

    let converter = factory
        .create_converter_from_text(&input, SbomFormat::CycloneDx)
        .unwrap();
    let bom = converter.convert(&input).unwrap();

    let back = factory
        .create_converter_from_text(bom.content(), SbomFormat::Spdx)
        .unwrap()
        .convert(bom.content())
        .unwrap();
    assert!(back.success(), "{}", back.format_plain());
    assert_eq!(parse(back.content())["SPDXID"], json!("SPDXRef-DOCUMENT"));
}
