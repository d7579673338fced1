//! Error types for challenge-response verification.

use thiserror::Error;

/// Errors from server-proof verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofError {
    /// A required proof header was absent from the response.
    #[error("missing proof header: {header}")]
    MissingHeaders {
        /// The first absent header name.
        header: &'static str,
    },

    /// The response timestamp is outside the freshness window. Checked
    /// before any signature work.
    #[error("server proof is stale")]
    StaleChallenge,

    /// The proof did not verify. Covers bad signatures, malformed
    /// public keys, and malformed signature encodings alike; the
    /// caller learns only that authentication failed.
    #[error("server authentication failed")]
    SignatureInvalid,

    /// The challenge was never issued or has already been consumed.
    #[error("unknown or already-consumed challenge")]
    UnknownChallenge,
}
