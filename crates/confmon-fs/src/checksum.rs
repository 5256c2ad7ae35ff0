//! SHA-256 checksum utilities
//!
//! Provides the canonical checksum format (`sha256:<hex>`) used for template
//! content hashes and drift detection.

use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX: &str = "sha256:";

fn encode(bytes: &[u8]) -> String {
    format!("{}{:x}", PREFIX, Sha256::digest(bytes))
}

/// `sha256:<hex>` of a template or script body.
pub fn compute_content_checksum(content: &str) -> String {
    encode(content.as_bytes())
}

/// `sha256:<hex>` of a file on disk.
pub fn compute_file_checksum(path: &Path) -> crate::Result<String> {
    let bytes = std::fs::read(path).map_err(|e| crate::Error::io(path, e))?;
    Ok(encode(&bytes))
}

/// True when `checksum` is the recorded digest of `content`.
///
/// A blank checksum never matches.
pub fn content_matches(content: &str, checksum: &str) -> bool {
    !checksum.is_empty() && compute_content_checksum(content) == checksum
}
