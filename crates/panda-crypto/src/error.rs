//! Error types for the primitives crate.

use thiserror::Error;

/// Errors from cryptographic primitives and codecs.
///
/// Verification-adjacent failures (`OpenFailed`, `UnwrapFailed`) carry no
/// detail: distinguishing a malformed input from a failed authentication
/// check would hand an attacker an oracle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material had the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// An IV had the wrong length.
    #[error("invalid iv length: expected {expected}, got {actual}")]
    InvalidIvLength {
        /// Required length in bytes.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// AEAD open failed: bad tag, wrong key, or corrupt ciphertext.
    #[error("aead open failed")]
    OpenFailed,

    /// RSA keypair generation failed.
    #[error("rsa keypair generation failed: {0}")]
    KeypairGeneration(String),

    /// Public key could not be encoded as SPKI DER.
    #[error("spki encoding failed: {0}")]
    SpkiEncode(String),

    /// SPKI DER bytes did not contain a usable RSA public key.
    #[error("spki decoding failed")]
    SpkiDecode,

    /// RSA-OAEP wrap failed.
    #[error("key wrap failed")]
    WrapFailed,

    /// RSA-OAEP unwrap failed: wrong keypair or corrupt wrapped bytes.
    #[error("key unwrap failed")]
    UnwrapFailed,

    /// Input was not valid base64.
    #[error("base64 decode failed")]
    Base64,

    /// Input was not valid hex.
    #[error("hex decode failed")]
    Hex,

    /// A derivation output length the KDF cannot produce.
    #[error("unsupported kdf output length: {0}")]
    OutputLength(usize),
}
