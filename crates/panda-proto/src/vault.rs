//! Vault command-channel messages.
//!
//! The vault runtime speaks a small JSON request/response protocol over an
//! asynchronous channel. Every request carries a caller-assigned correlation
//! `id`; every response echoes it, so a host-side handle can multiplex
//! concurrent callers over one channel.
//!
//! ```text
//! {"id":1,"cmd":"init"}                      -> {"id":1,"ok":true}
//! {"id":2,"cmd":"derive"}                    -> {"id":2,"ok":true}
//! {"id":3,"cmd":"encrypt","plain":"..."}     -> {"id":3,"ciphertext":"...","iv":"..."}
//! {"id":4,"cmd":"decrypt","cipher":"...","iv":"..."} -> {"id":4,"plain":"..."}
//! {"id":5,"cmd":"clearKeys"}                 -> {"id":5,"ok":true}
//! ```

use serde::{Deserialize, Serialize};

/// A command sent to the vault runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum VaultCommand {
    /// One-time channel handshake. Accepted exactly once per vault
    /// lifetime; later attempts are ignored.
    Init,

    /// Fetch and unwrap the master key from the key issuer. Idempotent.
    Derive,

    /// Encrypt a plaintext string under the master key.
    Encrypt {
        /// Plaintext to encrypt.
        plain: String,
    },

    /// Decrypt a ciphertext produced by `Encrypt`.
    Decrypt {
        /// Base64 ciphertext (including the authentication tag).
        cipher: String,
        /// Base64 12-byte IV the ciphertext was sealed with.
        iv: String,
    },

    /// Zeroize the master key and reset limiter state.
    ClearKeys,
}

/// A request envelope: correlation ID plus command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRequest {
    /// Caller-assigned correlation ID, echoed in the response.
    pub id: u64,

    /// The command to execute.
    #[serde(flatten)]
    pub cmd: VaultCommand,
}

/// Error codes surfaced over the channel.
///
/// These mirror the vault error taxonomy; the runtime never sends a
/// partial result alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultErrorCode {
    /// Command arrived before the init handshake completed.
    NotReady,

    /// Encrypt/decrypt attempted before a successful derive.
    #[serde(rename = "NoKeyError")]
    NoKey,

    /// Decrypt quota exceeded for the current window.
    RateLimited,

    /// The key issuer could not be reached or returned garbage.
    DerivationFailed,

    /// Ciphertext failed to authenticate under the master key.
    DecryptionFailed,
}

/// The body of a vault response, excluding the echoed ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VaultReply {
    /// Ciphertext and IV from a successful encrypt.
    Encrypted {
        /// Base64 ciphertext (including the authentication tag).
        ciphertext: String,
        /// Base64 12-byte IV.
        iv: String,
    },

    /// Plaintext from a successful decrypt.
    Decrypted {
        /// Recovered plaintext.
        plain: String,
    },

    /// The command failed.
    Failed {
        /// Error code; see [`VaultErrorCode`].
        error: VaultErrorCode,
    },

    /// Success acknowledgement for init/derive/clearKeys.
    Ack {
        /// Always `true`.
        ok: bool,
    },
}

impl VaultReply {
    /// Success acknowledgement.
    pub fn ack() -> Self {
        Self::Ack { ok: true }
    }
}

/// A response envelope: echoed correlation ID plus reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultResponse {
    /// Correlation ID copied from the request.
    pub id: u64,

    /// The reply body.
    #[serde(flatten)]
    pub reply: VaultReply,
}
