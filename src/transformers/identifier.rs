//! Version literals and element identifiers.

use crate::cdx_version::{CdxVersion, DEFAULT_SPDX_VERSION};
use crate::document::non_empty_str;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub const SPDX_REF_PREFIX: &str = "SPDXRef-";

pub const SPDX_DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";

const SPDX_NAMESPACE_BASE: &str = "https://spdx.org/spdxdocs";

static GENERATED_IDS: AtomicU64 = AtomicU64::new(1);

/// Rewrites schema version literals between SPDX and CycloneDX.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionTransformer;

impl VersionTransformer {
    /// `spdxVersion` -> `specVersion`
    pub fn spdx_to_cdx(value: &Value) -> Value {
        let version = value
            .as_str()
            .map(CdxVersion::from_spdx_version)
            .unwrap_or_default();
        Value::String(version.as_str().to_string())
    }

    /// `specVersion` -> `spdxVersion`
    pub fn cdx_to_spdx(value: &Value) -> Value {
        let version = value
            .as_str()
            .and_then(CdxVersion::parse)
            .map(CdxVersion::to_spdx_version)
            .unwrap_or(DEFAULT_SPDX_VERSION);
        Value::String(version.to_string())
    }
}

/// Builds and translates element and document identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierTransformer;

impl IdentifierTransformer {
    /// `documentNamespace` -> `serialNumber`.
    ///
    /// The same namespace always yields the same serial number.
    pub fn serial_number(value: &Value) -> Value {
        let uuid = match value.as_str().map(str::trim).filter(|s| !s.is_empty()) {
            Some(namespace) => Uuid::new_v5(&Uuid::NAMESPACE_URL, namespace.as_bytes()),
            None => Uuid::new_v4(),
        };
        Value::String(format!("urn:uuid:{}", uuid))
    }

    /// Fresh random serial number for a new CycloneDX document.
    pub fn random_serial_number() -> String {
        format!("urn:uuid:{}", Uuid::new_v4())
    }

    /// Unique SPDX document namespace for a document called `name`.
    pub fn document_namespace(name: &str) -> String {
        format!(
            "{}/{}-{}",
            SPDX_NAMESPACE_BASE,
            sanitize(name),
            Uuid::new_v4()
        )
    }

    pub fn bom_ref_from_spdx_id(spdx_id: &str) -> String {
        spdx_id
            .strip_prefix(SPDX_REF_PREFIX)
            .unwrap_or(spdx_id)
            .to_string()
    }

    pub fn spdx_id_from_bom_ref(bom_ref: &str) -> String {
        let bare = bom_ref.strip_prefix(SPDX_REF_PREFIX).unwrap_or(bom_ref);
        format!("{}{}", SPDX_REF_PREFIX, sanitize(bare))
    }

    /// `<prefix>-<name>-<n>`, `n` unique within the process.
    pub fn generate(prefix: &str, name: &str) -> String {
        let n = GENERATED_IDS.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, sanitize(name), n)
    }
}

/// SPDXIDs assigned to the components of one document.
///
/// Sanitizing a bom-ref is lossy, so two refs may land on the same SPDXID.
/// The later one gets a `-2`, `-3`, ... suffix. `SPDXRef-DOCUMENT` is
/// reserved for the document itself.
#[derive(Debug, Default, Clone)]
pub struct SpdxIdMap {
    by_ref: HashMap<String, String>,
    by_index: Vec<Option<String>>,
    used: HashSet<String>,
    renamed: Vec<(String, String)>,
}

impl SpdxIdMap {
    /// Assigns ids in component order. Records that are not objects or
    /// carry no `bom-ref` get no entry.
    pub fn from_components(components: &[Value]) -> Self {
        let mut map = Self::default();
        map.used.insert(SPDX_DOCUMENT_ID.to_string());

        for component in components {
            let Some(bom_ref) = component.as_object().and_then(|c| non_empty_str(c, "bom-ref")) else {
                map.by_index.push(None);
                continue;
            };
            let base = IdentifierTransformer::spdx_id_from_bom_ref(bom_ref);
            let id = if map.used.contains(&base) {
                let id = map.unused_with_suffix(&base);
                map.renamed.push((bom_ref.to_string(), id.clone()));
                id
            } else {
                base
            };
            map.used.insert(id.clone());
            map.by_ref.entry(bom_ref.to_string()).or_insert_with(|| id.clone());
            map.by_index.push(Some(id));
        }
        map
    }

    fn unused_with_suffix(&self, base: &str) -> String {
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.used.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Id of the component at `idx`, if it had a `bom-ref`.
    pub fn for_index(&self, idx: usize) -> Option<&str> {
        self.by_index.get(idx).and_then(|id| id.as_deref())
    }

    /// Id a `bom-ref` points to. Refs that match no component are
    /// translated on their own.
    pub fn resolve(&self, bom_ref: &str) -> String {
        let bom_ref = bom_ref.trim();
        match self.by_ref.get(bom_ref) {
            Some(id) => id.clone(),
            None => IdentifierTransformer::spdx_id_from_bom_ref(bom_ref),
        }
    }

    /// Fresh id for a component without a `bom-ref`.
    pub fn generate(&mut self, name: &str) -> String {
        let prefix = format!("{}Package", SPDX_REF_PREFIX);
        loop {
            let id = IdentifierTransformer::generate(&prefix, name);
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }

    /// `(bom-ref, id)` pairs that needed a suffix.
    pub fn renamed(&self) -> &[(String, String)] {
        &self.renamed
    }
}

/// Replace everything outside `[A-Za-z0-9.-]` by `-`.
fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
