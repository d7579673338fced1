//! Panda Challenge-Response Server Authentication
//!
//! Proves server identity per HTTP exchange, independent of TLS, so a
//! compromised or substituted backend is detected even behind a valid
//! certificate. The client attaches a fresh random challenge to each
//! request; the response must carry an ECDSA P-256 signature binding
//! that exact challenge to a recent timestamp and a server random.
//!
//! # Anti-tamper contract
//!
//! The signed payload is the ordered byte concatenation
//!
//! ```text
//! PROOF_TAG | timestamp | randomHex | challenge
//! ```
//!
//! Signer and verifier must agree on this construction byte-for-byte;
//! any deviation is indistinguishable from a forged signature.
//!
//! # Failure semantics
//!
//! Verification fails closed. Malformed public keys, malformed
//! signatures, and honest verification failures all collapse into
//! [`ProofError::SignatureInvalid`]: distinguishing them would give an
//! attacker an oracle. Freshness is checked before any signature work,
//! so stale responses cost no crypto.
//!
//! All functions are pure: the caller supplies randomness and the
//! current wall-clock second, which keeps every path deterministic
//! under test.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod challenge;
mod error;
mod verify;

pub use challenge::{CHALLENGE_SIZE, ChallengeRegistry, generate_challenge, request_header};
pub use error::ProofError;
pub use verify::{ChallengeResponse, PROOF_FRESHNESS_SECS, ServerProofHeaders, verify_server_proof};
