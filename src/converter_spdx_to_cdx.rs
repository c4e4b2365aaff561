//! Implements the SPDX -> CycloneDX conversion.
//!
//! The SPDX document is mapped onto a fresh CycloneDX 1.5 BOM. Packages
//! become components, relationships become the dependency graph and the
//! creation info becomes the BOM metadata.

use crate::cdx_version::CdxVersion;
use crate::converter::{ConversionPlan, Resolved};
use crate::document::Object;
use crate::mapping::{FieldMapping, FieldTransform, SPDX_TO_CDX};
use crate::transformers::{
    CreationInfoToMetadata, IdentifierTransformer, PackagesToComponents,
    RelationshipsToDependencies, VersionTransformer,
};
use crate::validation::{CDX_REQUIRED_FIELDS, SchemaValidator, SpdxValidator};
use crate::version_detection::{CDX_BOM_FORMAT, SbomFormat};
use serde_json::{Value, json};

pub struct SpdxToCdxConverter {
    validator: SpdxValidator,
    metadata: CreationInfoToMetadata,
    packages: PackagesToComponents,
    relationships: RelationshipsToDependencies,
}

impl SpdxToCdxConverter {
    pub fn new(
        metadata: CreationInfoToMetadata,
        packages: PackagesToComponents,
        relationships: RelationshipsToDependencies,
    ) -> Self {
        Self {
            validator: SpdxValidator::new(),
            metadata,
            packages,
            relationships,
        }
    }
}

impl Default for SpdxToCdxConverter {
    fn default() -> Self {
        Self::new(
            CreationInfoToMetadata::new(),
            PackagesToComponents::default(),
            RelationshipsToDependencies::new(),
        )
    }
}

impl ConversionPlan for SpdxToCdxConverter {
    fn name(&self) -> &'static str {
        "SpdxToCdxConverter"
    }

    fn source(&self) -> SbomFormat {
        SbomFormat::Spdx
    }

    fn target(&self) -> SbomFormat {
        SbomFormat::CycloneDx
    }

    fn validator(&self) -> &dyn SchemaValidator {
        &self.validator
    }

    fn target_required_fields(&self) -> &'static [&'static str] {
        CDX_REQUIRED_FIELDS
    }

    fn mappings(&self) -> &'static [FieldMapping] {
        SPDX_TO_CDX
    }

    fn initial_skeleton(&self, _source: &Object) -> Object {
        let mut bom = Object::new();
        bom.insert("bomFormat".to_string(), json!(CDX_BOM_FORMAT));
        bom.insert("specVersion".to_string(), json!(CdxVersion::default().as_str()));
        bom.insert(
            "serialNumber".to_string(),
            json!(IdentifierTransformer::random_serial_number()),
        );
        bom.insert("version".to_string(), json!(1));
        bom.insert("components".to_string(), Value::Array(Vec::new()));
        bom.insert("dependencies".to_string(), Value::Array(Vec::new()));
        bom
    }

    fn resolve(&self, transform: FieldTransform) -> Resolved<'_> {
        match transform {
            FieldTransform::Version => Resolved::Pure(VersionTransformer::spdx_to_cdx),
            FieldTransform::Identifier => Resolved::Pure(IdentifierTransformer::serial_number),
            FieldTransform::Metadata => Resolved::Fragment(&self.metadata),
            FieldTransform::Inventory => Resolved::Fragment(&self.packages),
            FieldTransform::Relationships => Resolved::Fragment(&self.relationships),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Converter;
    use pretty_assertions::assert_eq;

    fn convert(input: Value) -> (Value, crate::diagnostics::ConversionResult) {
        let result = SpdxToCdxConverter::default()
            .convert(&input.to_string())
            .unwrap();
        let bom = serde_json::from_str(result.content()).unwrap();
        (bom, result)
    }

    #[test]
    fn test_full_document() {
        let (bom, result) = convert(json!({
            "spdxVersion": "SPDX-2.2",
            "dataLicense": "CC0-1.0",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "demo",
            "documentNamespace": "https://example.com/demo",
            "creationInfo": {
                "created": "2024-05-01T10:00:00Z",
                "creators": ["Tool: scanner-2.0"]
            },
            "packages": [
                {
                    "SPDXID": "SPDXRef-app",
                    "name": "app",
                    "versionInfo": "1.0.0",
                    "licenseConcluded": "MIT"
                },
                {
                    "SPDXID": "SPDXRef-lib",
                    "name": "lib",
                    "versionInfo": "0.3.1",
                    "licenseDeclared": "Apache-2.0"
                }
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-app"},
                {"spdxElementId": "SPDXRef-app", "relationshipType": "DEPENDS_ON", "relatedSpdxElement": "SPDXRef-lib"}
            ]
        }));

        assert!(result.success(), "{}", result.format_plain());
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
        assert_eq!(bom["bomFormat"], json!("CycloneDX"));
        assert_eq!(bom["specVersion"], json!("1.4"));
        assert_eq!(
            bom["serialNumber"],
            IdentifierTransformer::serial_number(&json!("https://example.com/demo"))
        );
        assert_eq!(bom["metadata"]["timestamp"], json!("2024-05-01T10:00:00Z"));
        assert_eq!(bom["components"].as_array().unwrap().len(), 2);
        assert_eq!(bom["components"][0]["bom-ref"], json!("app"));
        assert_eq!(
            bom["dependencies"],
            json!([{"ref": "app", "dependsOn": ["lib"]}])
        );
    }

    #[test]
    fn test_skeleton_order() {
        let (bom, _) = convert(json!({
            "spdxVersion": "SPDX-2.3",
            "dataLicense": "CC0-1.0",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "x",
            "documentNamespace": "ns"
        }));

        let keys: Vec<&str> = bom.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["bomFormat", "specVersion", "serialNumber", "version", "components", "dependencies", "metadata"]
        );
    }

    #[test]
    fn test_formats() {
        let converter = SpdxToCdxConverter::default();
        assert_eq!(converter.source_format(), SbomFormat::Spdx);
        assert_eq!(converter.target_format(), SbomFormat::CycloneDx);
    }
}
