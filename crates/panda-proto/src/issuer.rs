//! Key-issuance HTTP bodies.
//!
//! `POST /deriveKey` serves two callers:
//!
//! - the vault runtime, which submits its RSA wrapping public key and
//!   receives the master key wrapped under it (`{"wrappedKey": ...}`)
//! - the password-envelope bootstrap, which submits nothing and receives
//!   the current rotation pair (`{"oldKey": ..., "newKey": ...}`)
//!
//! The server decides which shape to return; the client parses either.

use serde::{Deserialize, Serialize};

/// Request body for `POST /deriveKey`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveKeyRequest {
    /// Base64 SPKI DER of the caller's RSA-OAEP public key. Present when
    /// the caller wants the master key wrapped; absent in rotation mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_public_key: Option<String>,
}

impl DeriveKeyRequest {
    /// Request the master key wrapped under the given public key.
    pub fn wrapped(spki_der_b64: impl Into<String>) -> Self {
        Self { wrapping_public_key: Some(spki_der_b64.into()) }
    }

    /// Request the current rotation key pair.
    pub fn rotation() -> Self {
        Self { wrapping_public_key: None }
    }
}

/// Response body for `POST /deriveKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum DeriveKeyResponse {
    /// The master key, RSA-OAEP-wrapped under the submitted public key.
    #[serde(rename_all = "camelCase")]
    Wrapped {
        /// Base64 wrapped key bytes.
        wrapped_key: String,
    },

    /// The rotating symmetric key pair. `old_key == new_key` outside a
    /// rotation window; the server alone decides when they differ.
    #[serde(rename_all = "camelCase")]
    Rotating {
        /// Base64url (no padding) 32-byte key the previous envelope was
        /// sealed under.
        old_key: String,
        /// Base64url (no padding) 32-byte key for the replacement envelope.
        new_key: String,
    },
}
