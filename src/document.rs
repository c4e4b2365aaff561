//! Generic document tree and its JSON codec.
//!
//! Documents are plain `serde_json::Value` trees. The crate enables
//! `preserve_order`, so object keys keep insertion order on output.

use serde_json::{Map, Value};

pub type Document = Value;

pub type Object = Map<String, Value>;

/// Decode UTF-8 JSON text into a document tree.
pub fn decode(text: &str) -> Result<Document, serde_json::Error> {
    serde_json::from_str(text)
}

/// Encode a document tree as pretty-printed JSON.
pub fn encode(document: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Short description of a value's kind, used in diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// String field lookup that treats empty strings as absent.
pub fn non_empty_str<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
