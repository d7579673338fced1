//! Panda Cryptographic Primitives
//!
//! Cryptographic building blocks for the trust subsystem. Pure functions
//! with deterministic outputs. Callers provide random bytes (AEAD IVs,
//! challenge nonces) for deterministic testing.
//!
//! # Key Custody
//!
//! Two key types carry custody guarantees:
//!
//! - [`SecretKey`]: a 32-byte AES-256-GCM key. The vault's master key is
//!   the canonical instance. Zeroized on drop, `Debug`-redacted, never
//!   serialized; the raw bytes are visible only to the AEAD and wrap
//!   modules inside this crate.
//! - [`PasswordKdfHandle`]: owns a recovered plaintext password and
//!   exposes nothing but PBKDF2 derivation over it. The plaintext never
//!   leaves the handle.
//!
//! # Transport
//!
//! The master key travels exactly once, RSA-OAEP-wrapped under an
//! ephemeral keypair the receiving vault generated ([`WrappingKeypair`]).
//! Rotating envelope keys travel base64url-encoded inside an
//! authenticated, origin-restricted HTTP response and are consumed
//! immediately.
//!
//! # Security
//!
//! - AEAD: AES-256-GCM with 12-byte IVs; a failed tag check reports one
//!   opaque error with no detail that could become an oracle
//! - All fallible codecs return typed errors, never panic on bad input
//! - Key material is zeroized on drop wherever this crate owns it

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod codec;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod wrap;

mod error;

pub use aead::{IV_SIZE, TAG_SIZE, open, seal};
pub use error::CryptoError;
pub use keys::{KEY_SIZE, PasswordKdfHandle, SecretKey};
pub use wrap::{WrappingKeypair, wrap_key};
