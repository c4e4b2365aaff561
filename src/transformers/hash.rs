//! Hash digests: SPDX `checksums` <-> CycloneDX `hashes`.

use crate::diagnostics::Diagnostics;
use serde_json::{Value, json};

/// (SPDX algorithm, CycloneDX algorithm)
const ALGORITHMS: &[(&str, &str)] = &[
    ("MD5", "MD5"),
    ("SHA1", "SHA-1"),
    ("SHA256", "SHA-256"),
    ("SHA384", "SHA-384"),
    ("SHA512", "SHA-512"),
    ("SHA3-256", "SHA3-256"),
    ("SHA3-384", "SHA3-384"),
    ("SHA3-512", "SHA3-512"),
    ("BLAKE2b-256", "BLAKE2b-256"),
    ("BLAKE2b-384", "BLAKE2b-384"),
    ("BLAKE2b-512", "BLAKE2b-512"),
    ("BLAKE3", "BLAKE3"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct HashTransformer;

impl HashTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn cdx_algorithm(spdx_alg: &str) -> Option<&'static str> {
        ALGORITHMS
            .iter()
            .find(|(spdx, _)| spdx.eq_ignore_ascii_case(spdx_alg))
            .map(|(_, cdx)| *cdx)
    }

    pub fn spdx_algorithm(cdx_alg: &str) -> Option<&'static str> {
        ALGORITHMS
            .iter()
            .find(|(_, cdx)| cdx.eq_ignore_ascii_case(cdx_alg))
            .map(|(spdx, _)| *spdx)
    }

    /// `[{algorithm, checksumValue}]` -> `[{alg, content}]`
    pub fn checksums_to_hashes(
        &self,
        checksums: &[Value],
        owner: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Value> {
        let mut hashes = Vec::new();
        for checksum in checksums {
            let alg = checksum.get("algorithm").and_then(|v| v.as_str());
            let value = checksum.get("checksumValue").and_then(|v| v.as_str());
            let (Some(alg), Some(value)) = (alg, value) else {
                diagnostics.warn(format!("Skipping malformed checksum on '{}'", owner));
                continue;
            };
            let mapped = match Self::cdx_algorithm(alg) {
                Some(mapped) => mapped,
                None => {
                    diagnostics.warn(format!(
                        "Checksum algorithm '{}' on '{}' has no CycloneDX equivalent, kept as is",
                        alg, owner
                    ));
                    alg
                }
            };
            hashes.push(json!({ "alg": mapped, "content": value }));
        }
        hashes
    }

    /// `[{alg, content}]` -> `[{algorithm, checksumValue}]`
    pub fn hashes_to_checksums(
        &self,
        hashes: &[Value],
        owner: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Value> {
        let mut checksums = Vec::new();
        for hash in hashes {
            let alg = hash.get("alg").and_then(|v| v.as_str());
            let content = hash.get("content").and_then(|v| v.as_str());
            let (Some(alg), Some(content)) = (alg, content) else {
                diagnostics.warn(format!("Skipping malformed hash on '{}'", owner));
                continue;
            };
            let mapped = match Self::spdx_algorithm(alg) {
                Some(mapped) => mapped,
                None => {
                    diagnostics.warn(format!(
                        "Hash algorithm '{}' on '{}' has no SPDX equivalent, kept as is",
                        alg, owner
                    ));
                    alg
                }
            };
            checksums.push(json!({ "algorithm": mapped, "checksumValue": content }));
        }
        checksums
    }
}
