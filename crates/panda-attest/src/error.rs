//! Error types for attestation verification.

use thiserror::Error;

/// Errors from attestation verification. All fail closed; none leave a
/// partially verified result behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestError {
    /// The attestation token failed validation: bad signature, unknown
    /// key, expired, or claims that do not decode.
    #[error("attestation token invalid: {0}")]
    JwtInvalid(String),

    /// `SHA-256(quote)` did not equal the attested `quotehash` claim.
    #[error("quote hash mismatch")]
    QuoteHashMismatch,

    /// A replayed register did not equal its attested RTMR claim.
    #[error("measurement register {index} mismatch")]
    RegisterMismatch {
        /// Index of the first mismatching register.
        index: usize,
    },

    /// The event log lacks a required well-known event.
    #[error("event log missing required field: {field}")]
    MissingEventField {
        /// Name of the missing event.
        field: &'static str,
    },

    /// The quote is too short to contain its user-data region.
    #[error("quote too short: {actual} bytes")]
    QuoteTooShort {
        /// Length of the quote actually supplied.
        actual: usize,
    },

    /// An input was not decodable (hex quote, event digests, payloads).
    #[error("attestation input malformed: {0}")]
    Codec(String),

    /// The trust authority's key set could not be retrieved.
    #[error("jwks fetch failed: {0}")]
    JwksFetchFailed(String),
}
