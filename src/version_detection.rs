//! Format detection for SBOM documents
//!
//! Inspects a decoded document for the discriminator keys of each schema.

use crate::document::{self, Document};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// SBOM schema family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
pub enum SbomFormat {
    #[serde(rename = "SPDX")]
    #[value(name = "spdx")]
    Spdx,
    #[serde(rename = "CycloneDX")]
    #[value(name = "cyclonedx", alias = "cdx")]
    CycloneDx,
}

impl SbomFormat {
    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SbomFormat::Spdx => "SPDX",
            SbomFormat::CycloneDx => "CycloneDX",
        }
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SbomFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spdx" => Ok(SbomFormat::Spdx),
            "cyclonedx" | "cdx" => Ok(SbomFormat::CycloneDx),
            other => Err(format!("unknown SBOM format: {}", other)),
        }
    }
}

/// Marker value CycloneDX documents carry in `bomFormat`.
pub const CDX_BOM_FORMAT: &str = "CycloneDX";

/// Prefix every SPDX `spdxVersion` literal starts with.
pub const SPDX_VERSION_PREFIX: &str = "SPDX-";

/// Detect the SBOM format of a decoded document.
///
/// CycloneDX is checked first: its marker is an exact literal, so it is the
/// more specific of the two discriminators.
pub fn detect_format(value: &Document) -> Option<SbomFormat> {
    let obj = value.as_object()?;

    if obj.get("bomFormat").and_then(|v| v.as_str()) == Some(CDX_BOM_FORMAT) {
        return Some(SbomFormat::CycloneDx);
    }

    if let Some(spdx_version) = obj.get("spdxVersion").and_then(|v| v.as_str())
        && spdx_version.starts_with(SPDX_VERSION_PREFIX)
    {
        return Some(SbomFormat::Spdx);
    }

    None
}

/// Decode `text` and detect its format. Undecodable text yields `None`.
pub fn detect_format_from_text(text: &str) -> Option<SbomFormat> {
    document::decode(text).ok().as_ref().and_then(detect_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_cyclonedx() {
        let cdx = json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "version": 1
        });

        let format = detect_format(&cdx);
        assert_eq!(format, Some(SbomFormat::CycloneDx));
        assert_eq!(format.map(|f| f.name()), Some("CycloneDX"));
    }

    #[test]
    fn test_detect_spdx() {
        let spdx = json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT"
        });

        assert_eq!(detect_format(&spdx), Some(SbomFormat::Spdx));
    }

    #[test]
    fn test_marker_must_match_exactly() {
        assert_eq!(detect_format(&json!({"bomFormat": "cyclonedx"})), None);
        assert_eq!(detect_format(&json!({"bomFormat": "NotCycloneDX"})), None);
        assert_eq!(detect_format(&json!({"spdxVersion": "2.3"})), None);
        assert_eq!(detect_format(&json!({"spdxVersion": 2.3})), None);
    }

    #[test]
    fn test_cyclonedx_wins_over_spdx() {
        let both = json!({"bomFormat": "CycloneDX", "spdxVersion": "SPDX-2.3"});
        assert_eq!(detect_format(&both), Some(SbomFormat::CycloneDx));
    }

    #[test]
    fn test_bad_marker_falls_through_to_spdx() {
        let doc = json!({"bomFormat": "Other", "spdxVersion": "SPDX-2.2"});
        assert_eq!(detect_format(&doc), Some(SbomFormat::Spdx));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format(&json!({"someField": "someValue"})), None);
        assert_eq!(detect_format(&json!([1, 2, 3])), None);
        assert_eq!(detect_format(&json!("CycloneDX")), None);
    }

    #[test]
    fn test_detect_from_text() {
        assert_eq!(
            detect_format_from_text(r#"{"bomFormat":"CycloneDX"}"#),
            Some(SbomFormat::CycloneDx)
        );
        assert_eq!(detect_format_from_text("not json"), None);
    }

    #[test]
    fn test_format_from_str_and_display() {
        assert_eq!("SPDX".parse::<SbomFormat>(), Ok(SbomFormat::Spdx));
        assert_eq!("cdx".parse::<SbomFormat>(), Ok(SbomFormat::CycloneDx));
        assert!("xml".parse::<SbomFormat>().is_err());
        assert_eq!(SbomFormat::CycloneDx.to_string(), "CycloneDX");
    }
}
