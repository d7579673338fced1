//! One-shot hash helpers.
//!
//! Attestation verification mixes both widths: SHA-384 for register
//! replay, SHA-256 for quote binding and composite measurements.

use sha2::{Digest, Sha256, Sha384};

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-384 digest.
pub fn sha384(data: &[u8]) -> [u8; 48] {
    Sha384::digest(data).into()
}
