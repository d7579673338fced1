//! Error taxonomy for the vault runtime and the password envelope.
//!
//! All variants are terminal and reported to the caller; nothing is
//! silently retried here. Retry policy (for example re-deriving after a
//! rate-limit window clears) belongs to the host.

use thiserror::Error;

use panda_proto::VaultErrorCode;

/// Errors surfaced by vault operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultError {
    /// A command arrived before the init handshake completed.
    #[error("vault channel not initialized")]
    NotReady,

    /// Encrypt/decrypt attempted with no derived key (never derived,
    /// cleared, or zeroized by the idle timeout).
    #[error("no master key derived")]
    NoKey,

    /// Decrypt quota exceeded for the current window.
    #[error("decrypt rate limit exceeded")]
    RateLimited,

    /// The key issuer could not be reached or returned an unusable key.
    #[error("master key derivation failed")]
    DerivationFailed,

    /// Ciphertext failed to authenticate under the master key.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The vault runtime went away while a call was pending.
    #[error("vault channel closed")]
    ChannelClosed,

    /// The runtime answered with a reply shape the call did not expect.
    /// Indicates a protocol bug, not a recoverable condition.
    #[error("unexpected reply from vault")]
    UnexpectedReply,
}

impl From<VaultErrorCode> for VaultError {
    fn from(code: VaultErrorCode) -> Self {
        match code {
            VaultErrorCode::NotReady => Self::NotReady,
            VaultErrorCode::NoKey => Self::NoKey,
            VaultErrorCode::RateLimited => Self::RateLimited,
            VaultErrorCode::DerivationFailed => Self::DerivationFailed,
            VaultErrorCode::DecryptionFailed => Self::DecryptionFailed,
        }
    }
}

/// Errors from password-envelope bootstrap and rotation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The key issuer could not be reached or answered in the wrong mode.
    #[error("key issuer failed: {0}")]
    IssuerFailed(String),

    /// The envelope did not decrypt under the issued key: wrong key
    /// generation, corrupt envelope, or a legacy-format envelope whose
    /// schedule also failed.
    #[error("envelope decryption failed")]
    DecryptionFailed,

    /// The envelope blob is structurally invalid (not an envelope).
    #[error("envelope codec error: {0}")]
    Codec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_onto_taxonomy() {
        assert_eq!(VaultError::from(VaultErrorCode::NotReady), VaultError::NotReady);
        assert_eq!(VaultError::from(VaultErrorCode::NoKey), VaultError::NoKey);
        assert_eq!(VaultError::from(VaultErrorCode::RateLimited), VaultError::RateLimited);
        assert_eq!(
            VaultError::from(VaultErrorCode::DerivationFailed),
            VaultError::DerivationFailed
        );
        assert_eq!(
            VaultError::from(VaultErrorCode::DecryptionFailed),
            VaultError::DecryptionFailed
        );
    }
}
