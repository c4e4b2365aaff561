//! Edges: SPDX `relationships` <-> CycloneDX `dependencies`.

use super::identifier::{IdentifierTransformer, SPDX_DOCUMENT_ID, SpdxIdMap};
use super::{FragmentTransformer, expect_array, is_no_assertion};
use crate::diagnostics::Diagnostics;
use crate::document::{Object, kind_of, non_empty_str};
use crate::errors::TransformError;
use log::debug;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Orientation of a CycloneDX `dependsOn` edge relative to the SPDX one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeDirection {
    /// `spdxElementId` depends on `relatedSpdxElement`.
    Forward,
    /// `relatedSpdxElement` depends on `spdxElementId`.
    Reverse,
}

const RELATIONSHIP_TYPES: &[(&str, EdgeDirection)] = &[
    ("DEPENDS_ON", EdgeDirection::Forward),
    ("DEPENDENCY_OF", EdgeDirection::Reverse),
    ("BUILD_DEPENDENCY_OF", EdgeDirection::Reverse),
    ("DEV_DEPENDENCY_OF", EdgeDirection::Reverse),
    ("OPTIONAL_DEPENDENCY_OF", EdgeDirection::Reverse),
    ("PROVIDED_DEPENDENCY_OF", EdgeDirection::Reverse),
    ("TEST_DEPENDENCY_OF", EdgeDirection::Reverse),
    ("RUNTIME_DEPENDENCY_OF", EdgeDirection::Reverse),
];

pub const PROVIDES_COMMENT: &str = "CycloneDX provides";

fn spdx_relationship(from: &str, relationship_type: &str, to: &str) -> Value {
    json!({
        "spdxElementId": from,
        "relationshipType": relationship_type,
        "relatedSpdxElement": to
    })
}

/// Dependency lists keyed by `ref`, in first-seen order.
#[derive(Default)]
struct DependencyGroups {
    order: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl DependencyGroups {
    fn add(&mut self, from: String, to: String) {
        let idx = match self.index.get(&from) {
            Some(idx) => *idx,
            None => {
                self.order.push((from.clone(), Vec::new()));
                self.index.insert(from, self.order.len() - 1);
                self.order.len() - 1
            }
        };
        let targets = &mut self.order[idx].1;
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    fn into_value(self) -> Value {
        Value::Array(
            self.order
                .into_iter()
                .map(|(dep_ref, depends_on)| json!({ "ref": dep_ref, "dependsOn": depends_on }))
                .collect(),
        )
    }
}

/// SPDX `relationships` -> CycloneDX `dependencies`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationshipsToDependencies;

impl RelationshipsToDependencies {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentTransformer for RelationshipsToDependencies {
    fn name(&self) -> &'static str {
        "RelationshipTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let relationships = expect_array(fragment)?;
        let mut groups = DependencyGroups::default();

        for (idx, rel) in relationships.iter().enumerate() {
            let Some(obj) = rel.as_object() else {
                diagnostics.warn(format!(
                    "Skipping relationships[{}]: expected an object, found {}",
                    idx,
                    kind_of(rel)
                ));
                continue;
            };
            let from = non_empty_str(obj, "spdxElementId");
            let to = non_empty_str(obj, "relatedSpdxElement");
            let rel_type = non_empty_str(obj, "relationshipType");
            let (Some(from), Some(to), Some(rel_type)) = (from, to, rel_type) else {
                diagnostics.warn(format!("Skipping incomplete relationships[{}]", idx));
                continue;
            };

            if rel_type == "DESCRIBES" && from == SPDX_DOCUMENT_ID {
                debug!("Dropping document-level DESCRIBES edge to {}", to);
                continue;
            }
            if is_no_assertion(to) {
                continue;
            }

            let direction = match RELATIONSHIP_TYPES.iter().find(|(t, _)| *t == rel_type) {
                Some((_, direction)) => *direction,
                None => {
                    diagnostics.warn(format!(
                        "Relationship type '{}' ({} -> {}) has no CycloneDX equivalent, kept as a dependency",
                        rel_type, from, to
                    ));
                    EdgeDirection::Forward
                }
            };

            let from = IdentifierTransformer::bom_ref_from_spdx_id(from);
            let to = IdentifierTransformer::bom_ref_from_spdx_id(to);
            match direction {
                EdgeDirection::Forward => groups.add(from, to),
                EdgeDirection::Reverse => groups.add(to, from),
            }
        }

        Ok(groups.into_value())
    }
}

/// CycloneDX `dependencies` -> SPDX `relationships`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependenciesToRelationships;

impl DependenciesToRelationships {
    pub fn new() -> Self {
        Self
    }

    /// One `DESCRIBES` edge from the document to every component that
    /// carries a `bom-ref`. Every other record gets a warning.
    pub fn describes_relationships(components: &[Value], diagnostics: &mut Diagnostics) -> Vec<Value> {
        let ids = SpdxIdMap::from_components(components);
        let mut relationships = Vec::new();
        for (idx, component) in components.iter().enumerate() {
            match ids.for_index(idx) {
                Some(id) => relationships.push(spdx_relationship(SPDX_DOCUMENT_ID, "DESCRIBES", id)),
                None => {
                    let name = component
                        .as_object()
                        .and_then(|obj| non_empty_str(obj, "name"))
                        .unwrap_or("unknown");
                    diagnostics.warn(format!(
                        "Component '{}' missing identifier, cannot create relationship",
                        name
                    ));
                }
            }
        }
        relationships
    }

    fn targets<'a>(dependency: &'a Value, key: &str, diagnostics: &mut Diagnostics) -> Vec<&'a str> {
        match dependency.get(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(other) => {
                diagnostics.warn(format!(
                    "Dependency {} must be an array, found {}",
                    key,
                    kind_of(other)
                ));
                Vec::new()
            }
        }
    }
}

impl DependenciesToRelationships {
    fn convert(
        &self,
        fragment: &Value,
        ids: &SpdxIdMap,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let dependencies = expect_array(fragment)?;
        let mut relationships = Vec::new();

        for (idx, dependency) in dependencies.iter().enumerate() {
            let Some(dep_ref) = dependency.as_object().and_then(|d| non_empty_str(d, "ref")) else {
                diagnostics.warn(format!("Skipping dependencies[{}]: missing ref", idx));
                continue;
            };
            let from = ids.resolve(dep_ref);

            for target in Self::targets(dependency, "dependsOn", diagnostics) {
                relationships.push(spdx_relationship(&from, "DEPENDS_ON", &ids.resolve(target)));
            }

            for target in Self::targets(dependency, "provides", diagnostics) {
                diagnostics.warn(format!(
                    "'{}' provides '{}': no SPDX equivalent, recorded as OTHER",
                    dep_ref, target
                ));
                let mut rel = spdx_relationship(&from, "OTHER", &ids.resolve(target));
                rel["comment"] = json!(PROVIDES_COMMENT);
                relationships.push(rel);
            }
        }

        Ok(Value::Array(relationships))
    }
}

impl FragmentTransformer for DependenciesToRelationships {
    fn name(&self) -> &'static str {
        "RelationshipTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        self.convert(fragment, &SpdxIdMap::default(), diagnostics)
    }

    /// Refs resolve to the SPDXIDs the packages of `source` were given.
    fn transform_in(
        &self,
        fragment: &Value,
        source: &Object,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let components = source
            .get("components")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let ids = SpdxIdMap::from_components(components);
        self.convert(fragment, &ids, diagnostics)
    }
}
