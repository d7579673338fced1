//! Panda Attestation Verifier
//!
//! Validates a trusted-execution quote against a trust authority's
//! signed attestation token, replays the measurement event log, and
//! recomputes composite measurements. The output is a verdict object
//! (internally consistent, authority-signed measurements), not a trust
//! decision: callers compare `app_id` / `mr_system` / `compose_hash`
//! against their own allow-list policy.
//!
//! # Verification steps
//!
//! 1. Validate the JWT against the authority's JWKS (most recent key)
//!    and extract the attested measurement claims
//! 2. Recompute `SHA-256(quote)` and require equality with the
//!    `quotehash` claim; fail closed on mismatch
//! 3. Derive the device ID from the quote's embedded user-data region
//! 4. Replay the ordered event log into four SHA-384 registers and
//!    require each to equal its attested RTMR claim
//! 5. Extract the well-known application events; a missing required
//!    field is a hard failure, never a default
//! 6. Compute the composite measurements (`mr_aggregated`, `mr_system`,
//!    `mr_image`)
//!
//! Every failure is terminal and fail-closed: the caller receives a
//! rejection, never a partial or "probably fine" result.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod claims;
mod error;
mod jwks;
mod quote;
mod replay;
mod verifier;

pub use claims::AttestationClaims;
pub use error::AttestError;
pub use jwks::JwksClient;
pub use replay::{REGISTER_COUNT, replay_event_log};
pub use verifier::{AttestationResult, AttestationVerifier, verify_attestation};
