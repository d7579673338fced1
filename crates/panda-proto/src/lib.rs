//! Panda Trust Protocol Types
//!
//! Wire and channel shapes shared by the trust subsystem crates:
//!
//! - Vault command channel messages ([`VaultRequest`] / [`VaultResponse`])
//!   with caller-assigned correlation IDs
//! - Key-issuance HTTP bodies ([`DeriveKeyRequest`] / [`DeriveKeyResponse`])
//! - Challenge-response header names ([`headers`])
//! - Attestation event-log entries ([`EventLogEntry`])
//!
//! This crate contains no cryptography and no I/O. Everything here is a
//! plain serde type so the host application, the vault runtime, and tests
//! all agree byte-for-byte on the JSON they exchange.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod event_log;
pub mod headers;
pub mod issuer;
pub mod vault;

mod error;

pub use error::ProtocolError;
pub use event_log::{EventLogEntry, parse_event_log};
pub use issuer::{DeriveKeyRequest, DeriveKeyResponse};
pub use vault::{VaultCommand, VaultErrorCode, VaultReply, VaultRequest, VaultResponse};
