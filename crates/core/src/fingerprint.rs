//! Canonical request fingerprints used as cache keys.
//!
//! The fingerprint is computed from the normalized request, never from the
//! raw body, so key order, whitespace and language aliases do not matter.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::request::NormalizedRequest;

/// Bumped whenever the canonical form changes, so stale entries stop matching.
const CANONICAL_VERSION: u32 = 1;

/// Prefix of every cache key written by the orchestrator.
pub const KEY_PREFIX: &str = "coderun:v1:";

/// Fixed-order view of a request. Field order here is the canonical order.
#[derive(Serialize)]
struct CanonicalRequest<'a> {
    v: u32,
    language: &'static str,
    timeout: u64,
    code: &'a str,
    args: &'a [String],
    env: &'a BTreeMap<String, String>,
}

/// SHA-256 digest of a canonical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &NormalizedRequest) -> Self {
        let canonical = CanonicalRequest {
            v: CANONICAL_VERSION,
            language: request.language.as_str(),
            timeout: request.timeout_secs,
            code: &request.code,
            args: &request.args,
            env: &request.env,
        };
        // Serializing strings, integers and a BTreeMap cannot fail.
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        Self(sha256_hex(&bytes))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Key under which the outcome is stored in the result cache.
    pub fn cache_key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.0)
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
