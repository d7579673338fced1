//! Server-proof verification.

use p256::ecdsa::{Signature, VerifyingKey, signature::Verifier};

use panda_proto::headers;

use crate::error::ProofError;

/// Domain tag prefixed to every signed proof payload.
///
/// Signer and verifier must agree on this byte-for-byte; it is part of
/// the wire contract, not a local constant.
const PROOF_TAG: &[u8] = b"panda-server-proof-v1:";

/// Maximum age of a server proof in seconds.
pub const PROOF_FRESHNESS_SECS: u64 = 180;

/// Raw proof material extracted from response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProofHeaders {
    /// Compressed SEC1 P-256 public key, hex.
    pub public_key: String,

    /// 64-byte compact ECDSA signature, hex.
    pub signature: String,

    /// Unix seconds at which the server produced the proof, decimal.
    pub timestamp: String,

    /// Server-generated random value, hex.
    pub server_random: String,
}

impl ServerProofHeaders {
    /// Extract the required headers through a lookup closure (header
    /// maps differ per HTTP client; the closure adapts).
    ///
    /// # Errors
    ///
    /// Returns `MissingHeaders` naming the first absent header.
    pub fn from_lookup(
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProofError> {
        let fetch = |name: &'static str| {
            get(name).ok_or(ProofError::MissingHeaders { header: name })
        };

        Ok(Self {
            public_key: fetch(headers::PUBLIC_KEY)?,
            signature: fetch(headers::SIGNATURE)?,
            timestamp: fetch(headers::TIMESTAMP)?,
            server_random: fetch(headers::SERVER_RANDOM)?,
        })
    }
}

/// A verified server proof.
///
/// Immutable once produced; each instance attests one response for one
/// challenge, verified exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// The server's public key as received (compressed SEC1 hex).
    pub public_key: String,

    /// The challenge this proof answered.
    pub challenge: String,

    /// The signature that verified, hex.
    pub signature: String,

    /// Proof timestamp, Unix seconds.
    pub timestamp: u64,

    /// The server random bound into the payload, hex.
    pub random_hex: String,
}

/// Verify a server proof against the challenge it must answer.
///
/// Freshness is checked first: a stale proof is rejected before any
/// signature work. Everything after that (key decoding, signature
/// decoding, verification proper) collapses into `SignatureInvalid`.
///
/// # Errors
///
/// - `StaleChallenge`: `timestamp + 180s` is in the past
/// - `SignatureInvalid`: anything else that is not a valid, matching
///   signature from the presented key
pub fn verify_server_proof(
    proof: &ServerProofHeaders,
    challenge: &str,
    now_secs: u64,
) -> Result<ChallengeResponse, ProofError> {
    // An unparseable timestamp cannot prove freshness; it fails like a
    // bad signature rather than revealing which field was malformed.
    let timestamp: u64 =
        proof.timestamp.parse().map_err(|_| ProofError::SignatureInvalid)?;

    if timestamp + PROOF_FRESHNESS_SECS < now_secs {
        tracing::debug!(timestamp, now_secs, "rejecting stale server proof");
        return Err(ProofError::StaleChallenge);
    }

    let payload = signed_payload(&proof.timestamp, &proof.server_random, challenge);

    let key_bytes = hex::decode(&proof.public_key).map_err(|_| ProofError::SignatureInvalid)?;
    let key =
        VerifyingKey::from_sec1_bytes(&key_bytes).map_err(|_| ProofError::SignatureInvalid)?;

    let sig_bytes = hex::decode(&proof.signature).map_err(|_| ProofError::SignatureInvalid)?;
    let signature =
        Signature::from_slice(&sig_bytes).map_err(|_| ProofError::SignatureInvalid)?;

    key.verify(&payload, &signature).map_err(|_| ProofError::SignatureInvalid)?;

    Ok(ChallengeResponse {
        public_key: proof.public_key.clone(),
        challenge: challenge.to_string(),
        signature: proof.signature.clone(),
        timestamp,
        random_hex: proof.server_random.clone(),
    })
}

/// The exact bytes the server signs: `PROOF_TAG | timestamp | randomHex
/// | challenge`, all as UTF-8.
pub(crate) fn signed_payload(timestamp: &str, random_hex: &str, challenge: &str) -> Vec<u8> {
    let mut payload =
        Vec::with_capacity(PROOF_TAG.len() + timestamp.len() + random_hex.len() + challenge.len());
    payload.extend_from_slice(PROOF_TAG);
    payload.extend_from_slice(timestamp.as_bytes());
    payload.extend_from_slice(random_hex.as_bytes());
    payload.extend_from_slice(challenge.as_bytes());
    payload
}
