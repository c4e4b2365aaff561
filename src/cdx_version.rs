//! CycloneDX version types and the SPDX version lookup

/// CycloneDX specification version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CdxVersion {
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    V1_7,
}

pub const SUPPORTED_CDX_VERSIONS: [&str; 6] = ["1.2", "1.3", "1.4", "1.5", "1.6", "1.7"];

pub const SUPPORTED_SPDX_VERSIONS: [&str; 3] = ["SPDX-2.1", "SPDX-2.2", "SPDX-2.3"];

/// SPDX version written when nothing better is known.
pub const DEFAULT_SPDX_VERSION: &str = "SPDX-2.3";

impl CdxVersion {
    /// Get the version string (e.g., "1.5")
    pub fn as_str(&self) -> &'static str {
        match self {
            CdxVersion::V1_2 => "1.2",
            CdxVersion::V1_3 => "1.3",
            CdxVersion::V1_4 => "1.4",
            CdxVersion::V1_5 => "1.5",
            CdxVersion::V1_6 => "1.6",
            CdxVersion::V1_7 => "1.7",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1.2" => Some(CdxVersion::V1_2),
            "1.3" => Some(CdxVersion::V1_3),
            "1.4" => Some(CdxVersion::V1_4),
            "1.5" => Some(CdxVersion::V1_5),
            "1.6" => Some(CdxVersion::V1_6),
            "1.7" => Some(CdxVersion::V1_7),
            _ => None,
        }
    }

    /// CycloneDX version matching an `spdxVersion` literal.
    pub fn from_spdx_version(spdx_version: &str) -> Self {
        match spdx_version {
            "SPDX-2.1" => CdxVersion::V1_3,
            "SPDX-2.2" => CdxVersion::V1_4,
            _ => CdxVersion::default(),
        }
    }

    /// `spdxVersion` literal matching this CycloneDX version.
    pub fn to_spdx_version(self) -> &'static str {
        if self <= CdxVersion::V1_3 {
            "SPDX-2.2"
        } else {
            DEFAULT_SPDX_VERSION
        }
    }
}

impl Default for CdxVersion {
    fn default() -> Self {
        Self::V1_5
    }
}
