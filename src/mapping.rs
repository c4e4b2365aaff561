//! Declarative field mapping tables, one per conversion direction.
//!
//! Table order is iteration order, and therefore the order in which mapped
//! fields are written into the target document.

/// Field category a mapped value is routed through.
///
/// Each direction resolves every variant to one of its injected
/// transformers with an exhaustive `match`, so a table entry can never name
/// a transform that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTransform {
    /// Spec version literal rewrite (pure).
    Version,
    /// Document identifier rewrite (pure).
    Identifier,
    /// Creation metadata block.
    Metadata,
    /// Package/component inventory list.
    Inventory,
    /// Relationship/dependency edge list.
    Relationships,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub source_field: &'static str,
    /// `None` means the field is dropped on purpose.
    pub target_field: Option<&'static str>,
    pub transform: Option<FieldTransform>,
}

impl FieldMapping {
    pub const fn mapped(
        source_field: &'static str,
        target_field: &'static str,
        transform: Option<FieldTransform>,
    ) -> Self {
        Self {
            source_field,
            target_field: Some(target_field),
            transform,
        }
    }

    pub const fn dropped(source_field: &'static str) -> Self {
        Self {
            source_field,
            target_field: None,
            transform: None,
        }
    }
}

use FieldTransform::*;

pub const SPDX_TO_CDX: &[FieldMapping] = &[
    FieldMapping::mapped("spdxVersion", "specVersion", Some(Version)),
    FieldMapping::dropped("dataLicense"),
    FieldMapping::dropped("SPDXID"),
    FieldMapping::dropped("name"),
    FieldMapping::mapped("documentNamespace", "serialNumber", Some(Identifier)),
    FieldMapping::mapped("creationInfo", "metadata", Some(Metadata)),
    FieldMapping::mapped("packages", "components", Some(Inventory)),
    FieldMapping::mapped("relationships", "dependencies", Some(Relationships)),
    FieldMapping::dropped("documentDescribes"),
    FieldMapping::dropped("comment"),
    FieldMapping::dropped("externalDocumentRefs"),
    FieldMapping::dropped("hasExtractedLicensingInfos"),
    FieldMapping::dropped("files"),
    FieldMapping::dropped("snippets"),
    FieldMapping::dropped("annotations"),
];

pub const CDX_TO_SPDX: &[FieldMapping] = &[
    FieldMapping::dropped("bomFormat"),
    FieldMapping::mapped("specVersion", "spdxVersion", Some(Version)),
    // The SPDX side always uses the fixed document identifier.
    FieldMapping::dropped("serialNumber"),
    FieldMapping::dropped("version"),
    FieldMapping::dropped("$schema"),
    FieldMapping::mapped("metadata", "creationInfo", Some(Metadata)),
    FieldMapping::mapped("components", "packages", Some(Inventory)),
    FieldMapping::mapped("dependencies", "relationships", Some(Relationships)),
    FieldMapping::dropped("services"),
    FieldMapping::dropped("externalReferences"),
    FieldMapping::dropped("compositions"),
    FieldMapping::dropped("vulnerabilities"),
    FieldMapping::dropped("annotations"),
    FieldMapping::dropped("formulation"),
    FieldMapping::dropped("properties"),
    FieldMapping::dropped("signature"),
    FieldMapping::dropped("definitions"),
    FieldMapping::dropped("declarations"),
];

/// True when `table` has an entry (mapped or dropped) for `source_field`.
pub fn is_known(table: &[FieldMapping], source_field: &str) -> bool {
    table.iter().any(|m| m.source_field == source_field)
}
