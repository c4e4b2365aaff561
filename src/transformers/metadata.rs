//! Creation metadata: SPDX `creationInfo` <-> CycloneDX `metadata`.
//!
//! SPDX encodes creators as prefixed strings (`Tool: x-1.0`,
//! `Person: Jane (jane@example.com)`, `Organization: Acme`). CycloneDX
//! splits them into `tools`, `authors` and `supplier`.

use super::{FragmentTransformer, expect_object};
use crate::diagnostics::Diagnostics;
use crate::document::{Object, non_empty_str};
use crate::errors::TransformError;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

pub const TOOL_NAME: &str = "sbom-bridge";

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timestamp layout SPDX 2.x mandates for `created`.
const SPDX_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn now_spdx() -> String {
    Utc::now().format(SPDX_TIMESTAMP_FORMAT).to_string()
}

/// A parsed SPDX creator string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Creator {
    Tool { name: String, version: Option<String> },
    Person { name: String, email: Option<String> },
    Organization { name: String },
}

impl Creator {
    fn parse(raw: &str) -> Option<Self> {
        let (kind, rest) = raw.split_once(':')?;
        let rest = rest.trim();
        if rest.is_empty() {
            return None;
        }
        match kind.trim() {
            "Tool" => {
                let (name, version) = match rest.rsplit_once('-') {
                    Some((name, version))
                        if version.starts_with(|c: char| c.is_ascii_digit()) =>
                    {
                        (name.to_string(), Some(version.to_string()))
                    }
                    _ => (rest.to_string(), None),
                };
                Some(Creator::Tool { name, version })
            }
            "Person" => {
                let (name, email) = split_email(rest);
                Some(Creator::Person { name, email })
            }
            "Organization" => {
                let (name, _) = split_email(rest);
                Some(Creator::Organization { name })
            }
            _ => None,
        }
    }
}

/// `Jane Doe (jane@example.com)` -> ("Jane Doe", Some("jane@example.com"))
fn split_email(raw: &str) -> (String, Option<String>) {
    if let Some(open) = raw.rfind('(')
        && raw.ends_with(')')
    {
        let email = raw[open + 1..raw.len() - 1].trim();
        let name = raw[..open].trim().to_string();
        let email = (!email.is_empty()).then(|| email.to_string());
        return (name, email);
    }
    (raw.trim().to_string(), None)
}

/// SPDX `creationInfo` -> CycloneDX `metadata`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreationInfoToMetadata;

impl CreationInfoToMetadata {
    pub fn new() -> Self {
        Self
    }

    /// Metadata for a document whose source carried none.
    pub fn default_metadata() -> Value {
        json!({
            "timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "tools": [{ "vendor": TOOL_NAME, "name": TOOL_NAME, "version": TOOL_VERSION }]
        })
    }
}

impl FragmentTransformer for CreationInfoToMetadata {
    fn name(&self) -> &'static str {
        "MetadataTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let info = expect_object(fragment)?;
        let mut metadata = Object::new();

        match non_empty_str(info, "created") {
            Some(created) => {
                metadata.insert("timestamp".to_string(), json!(created));
            }
            None => diagnostics.warn("SPDX creationInfo has no 'created' timestamp"),
        }

        let mut tools = Vec::new();
        let mut authors = Vec::new();
        let mut organizations = Vec::new();
        let creators = info.get("creators").and_then(|v| v.as_array());
        for raw in creators.into_iter().flatten() {
            let parsed = raw.as_str().and_then(Creator::parse);
            match parsed {
                Some(Creator::Tool { name, version }) => {
                    let mut tool = Object::new();
                    tool.insert("name".to_string(), json!(name));
                    if let Some(version) = version {
                        tool.insert("version".to_string(), json!(version));
                    }
                    tools.push(Value::Object(tool));
                }
                Some(Creator::Person { name, email }) => {
                    let mut author = Object::new();
                    author.insert("name".to_string(), json!(name));
                    if let Some(email) = email {
                        author.insert("email".to_string(), json!(email));
                    }
                    authors.push(Value::Object(author));
                }
                Some(Creator::Organization { name }) => organizations.push(name),
                None => diagnostics.warn(format!("Unrecognized SPDX creator: {}", raw)),
            }
        }

        if !tools.is_empty() {
            metadata.insert("tools".to_string(), Value::Array(tools));
        }
        if !authors.is_empty() {
            metadata.insert("authors".to_string(), Value::Array(authors));
        }
        let mut organizations = organizations.into_iter();
        if let Some(first) = organizations.next() {
            metadata.insert("supplier".to_string(), json!({ "name": first }));
        }
        for extra in organizations {
            diagnostics.warn(format!(
                "CycloneDX metadata holds a single supplier, dropping organization '{}'",
                extra
            ));
        }

        Ok(Value::Object(metadata))
    }

    fn default_fragment(&self) -> Option<Value> {
        Some(Self::default_metadata())
    }
}

/// CycloneDX `metadata` -> SPDX `creationInfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataToCreationInfo;

impl MetadataToCreationInfo {
    pub fn new() -> Self {
        Self
    }

    pub fn default_creation_info() -> Value {
        json!({
            "created": now_spdx(),
            "creators": [default_tool_creator()]
        })
    }

    /// Tools appear either as a legacy array or as `{components, services}`.
    fn tool_entries(tools: &Value) -> Vec<&Value> {
        match tools {
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => ["components", "services"]
                .iter()
                .filter_map(|key| obj.get(*key).and_then(|v| v.as_array()))
                .flatten()
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn default_tool_creator() -> String {
    format!("Tool: {}-{}", TOOL_NAME, TOOL_VERSION)
}

fn normalize_timestamp(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).format(SPDX_TIMESTAMP_FORMAT).to_string())
}

impl FragmentTransformer for MetadataToCreationInfo {
    fn name(&self) -> &'static str {
        "MetadataTransformer"
    }

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        let metadata = expect_object(fragment)?;

        let created = match non_empty_str(metadata, "timestamp") {
            Some(raw) => normalize_timestamp(raw).unwrap_or_else(|| {
                diagnostics.warn(format!(
                    "CycloneDX timestamp '{}' is not RFC 3339, copied unchanged",
                    raw
                ));
                raw.to_string()
            }),
            None => {
                diagnostics.warn("CycloneDX metadata has no timestamp, using the current time");
                now_spdx()
            }
        };

        let mut creators = Vec::new();
        if let Some(tools) = metadata.get("tools") {
            for tool in Self::tool_entries(tools) {
                let Some(name) = tool.get("name").and_then(|v| v.as_str()) else {
                    diagnostics.warn("Skipping CycloneDX tool without a name");
                    continue;
                };
                match tool.get("version").and_then(|v| v.as_str()) {
                    Some(version) => creators.push(format!("Tool: {}-{}", name, version)),
                    None => creators.push(format!("Tool: {}", name)),
                }
            }
        }

        let authors = metadata.get("authors").and_then(|v| v.as_array());
        for author in authors.into_iter().flatten() {
            let Some(name) = author.get("name").and_then(|v| v.as_str()) else {
                diagnostics.warn("Skipping CycloneDX author without a name");
                continue;
            };
            match author.get("email").and_then(|v| v.as_str()) {
                Some(email) => creators.push(format!("Person: {} ({})", name, email)),
                None => creators.push(format!("Person: {}", name)),
            }
        }

        for key in ["supplier", "manufacturer", "manufacture"] {
            if let Some(name) = metadata
                .get(key)
                .and_then(|org| org.get("name"))
                .and_then(|v| v.as_str())
            {
                let creator = format!("Organization: {}", name);
                if !creators.contains(&creator) {
                    creators.push(creator);
                }
            }
        }

        if creators.is_empty() {
            creators.push(default_tool_creator());
        }

        Ok(json!({ "created": created, "creators": creators }))
    }

    fn default_fragment(&self) -> Option<Value> {
        Some(Self::default_creation_info())
    }
}
