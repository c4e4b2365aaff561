//! License expressions: SPDX `licenseConcluded`/`licenseDeclared` <->
//! CycloneDX `licenses`.

use super::is_no_assertion;
use crate::document::Object;
use serde_json::{Value, json};

/// SPDX package fields holding a license, in order of preference.
pub const SPDX_LICENSE_FIELDS: [&str; 2] = ["licenseConcluded", "licenseDeclared"];

#[derive(Debug, Default, Clone, Copy)]
pub struct LicenseTransformer;

impl LicenseTransformer {
    pub fn new() -> Self {
        Self
    }

    /// First SPDX license field carrying an actual expression.
    pub fn reconcile_spdx<'a>(&self, package: &'a Object) -> Option<&'a str> {
        SPDX_LICENSE_FIELDS
            .iter()
            .filter_map(|field| package.get(*field).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|expr| !is_no_assertion(expr))
    }

    /// SPDX expression -> CycloneDX license choices.
    pub fn expression_to_cdx(&self, expression: &str) -> Vec<Value> {
        if is_simple_identifier(expression) {
            if expression.starts_with("LicenseRef-") {
                vec![json!({ "license": { "name": expression } })]
            } else {
                vec![json!({ "license": { "id": expression } })]
            }
        } else {
            vec![json!({ "expression": expression })]
        }
    }

    /// CycloneDX license choices -> one SPDX expression.
    ///
    /// Several choices are joined with `AND`. Named licenses without an id
    /// become `LicenseRef-` identifiers.
    pub fn cdx_to_expression(&self, licenses: &[Value]) -> Option<String> {
        let parts: Vec<String> = licenses
            .iter()
            .filter_map(|choice| {
                if let Some(expr) = choice.get("expression").and_then(|v| v.as_str()) {
                    return Some(expr.trim().to_string());
                }
                let license = choice.get("license")?;
                if let Some(id) = license.get("id").and_then(|v| v.as_str()) {
                    return Some(id.trim().to_string());
                }
                license
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(license_ref)
            })
            .filter(|part| !part.is_empty())
            .collect();

        match parts.len() {
            0 => None,
            1 => parts.into_iter().next(),
            _ => Some(
                parts
                    .iter()
                    .map(|p| {
                        if is_simple_identifier(p) {
                            p.clone()
                        } else {
                            format!("({})", p)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }
}

fn is_simple_identifier(expression: &str) -> bool {
    !expression.is_empty()
        && expression
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
}

fn license_ref(name: &str) -> String {
    if name.starts_with("LicenseRef-") {
        return name.to_string();
    }
    let slug: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect();
    format!("LicenseRef-{}", slug)
}
