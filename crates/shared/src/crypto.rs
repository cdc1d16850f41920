//! Hashing helpers for bearer tokens.
//!
//! Tokens are configured as SHA-256 hex digests so plaintext secrets never
//! live in configuration files.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Returns true when the SHA-256 of `token` matches one of `allowed_hashes`.
///
/// Hashes are compared case-insensitively since operators paste them from
/// different tools.
pub fn token_matches(token: &str, allowed_hashes: &[String]) -> bool {
    let digest = sha256_hex(token);
    allowed_hashes
        .iter()
        .any(|h| constant_time_eq(&digest, &h.trim().to_ascii_lowercase()))
}
