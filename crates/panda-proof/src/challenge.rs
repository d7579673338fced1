//! Challenge generation and single-use tracking.

use std::collections::HashSet;

use panda_proto::headers;

use crate::{
    error::ProofError,
    verify::{ChallengeResponse, ServerProofHeaders, verify_server_proof},
};

/// Challenge nonce size in bytes before hex encoding.
pub const CHALLENGE_SIZE: usize = 32;

/// Hex-encode 32 caller-provided random bytes into a challenge nonce.
///
/// The caller draws the bytes from a cryptographically secure RNG in
/// production; tests pass fixed bytes.
pub fn generate_challenge(random: &[u8; CHALLENGE_SIZE]) -> String {
    hex::encode(random)
}

/// The request header pair carrying a challenge.
pub fn request_header(challenge: &str) -> (&'static str, String) {
    (headers::CHALLENGE, challenge.to_string())
}

/// Tracks outstanding challenges so each verifies at most once.
///
/// A challenge is consumed by its first verification attempt, pass or
/// fail: a failed proof must not leave the nonce replayable. Expiry is
/// enforced by the proof timestamp during verification, so entries for
/// responses that never arrive are bounded only by the host dropping
/// the registry with its session.
#[derive(Debug, Default)]
pub struct ChallengeRegistry {
    outstanding: HashSet<String>,
}

impl ChallengeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a challenge from caller-provided random bytes and record
    /// it as outstanding.
    pub fn issue(&mut self, random: &[u8; CHALLENGE_SIZE]) -> String {
        let challenge = generate_challenge(random);
        self.outstanding.insert(challenge.clone());
        challenge
    }

    /// Number of challenges awaiting a response.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Verify a server proof against an outstanding challenge,
    /// consuming the challenge.
    ///
    /// # Errors
    ///
    /// - `UnknownChallenge`: never issued, or already consumed
    /// - anything [`verify_server_proof`] reports
    pub fn verify(
        &mut self,
        proof: &ServerProofHeaders,
        challenge: &str,
        now_secs: u64,
    ) -> Result<ChallengeResponse, ProofError> {
        if !self.outstanding.remove(challenge) {
            return Err(ProofError::UnknownChallenge);
        }

        verify_server_proof(proof, challenge, now_secs)
    }
}

#[cfg(test)]
mod tests {
    use p256::ecdsa::{Signature, SigningKey, signature::Signer};

    use super::*;

    fn proof_for(key: &SigningKey, challenge: &str, timestamp: u64) -> ServerProofHeaders {
        let payload =
            crate::verify::signed_payload(&timestamp.to_string(), "0ddba11", challenge);
        let signature: Signature = key.sign(&payload);

        ServerProofHeaders {
            public_key: hex::encode(key.verifying_key().to_encoded_point(true).as_bytes()),
            signature: hex::encode(signature.to_bytes()),
            timestamp: timestamp.to_string(),
            server_random: "0ddba11".to_string(),
        }
    }

    #[test]
    fn challenge_is_64_hex_chars() {
        let challenge = generate_challenge(&[0xCD; 32]);

        assert_eq!(challenge.len(), 64);
        assert!(challenge.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn request_header_uses_protocol_name() {
        let (name, value) = request_header("abc");

        assert_eq!(name, "Panda-Challenge");
        assert_eq!(value, "abc");
    }

    #[test]
    fn issued_challenge_verifies_exactly_once() {
        let key = SigningKey::from_slice(&[0x29; 32]).unwrap();
        let mut registry = ChallengeRegistry::new();

        let challenge = registry.issue(&[0x01; 32]);
        let proof = proof_for(&key, &challenge, 5_000);

        registry.verify(&proof, &challenge, 5_010).unwrap();

        // Replaying the identical, perfectly valid proof must fail.
        assert_eq!(
            registry.verify(&proof, &challenge, 5_010).unwrap_err(),
            ProofError::UnknownChallenge
        );
    }

    #[test]
    fn unissued_challenge_is_rejected() {
        let key = SigningKey::from_slice(&[0x29; 32]).unwrap();
        let mut registry = ChallengeRegistry::new();

        let proof = proof_for(&key, "deadbeef", 5_000);

        assert_eq!(
            registry.verify(&proof, "deadbeef", 5_010).unwrap_err(),
            ProofError::UnknownChallenge
        );
    }

    #[test]
    fn failed_verification_still_consumes_the_challenge() {
        let key = SigningKey::from_slice(&[0x29; 32]).unwrap();
        let mut registry = ChallengeRegistry::new();

        let challenge = registry.issue(&[0x02; 32]);
        let mut proof = proof_for(&key, &challenge, 5_000);
        proof.server_random = "tampered".to_string();

        assert_eq!(
            registry.verify(&proof, &challenge, 5_010).unwrap_err(),
            ProofError::SignatureInvalid
        );
        assert_eq!(registry.outstanding(), 0);

        // Even a now-correct proof cannot ride the consumed nonce.
        let good = proof_for(&key, &challenge, 5_000);
        assert_eq!(
            registry.verify(&good, &challenge, 5_010).unwrap_err(),
            ProofError::UnknownChallenge
        );
    }

    #[test]
    fn distinct_randomness_yields_distinct_challenges() {
        let mut registry = ChallengeRegistry::new();

        let a = registry.issue(&[0x01; 32]);
        let b = registry.issue(&[0x02; 32]);

        assert_ne!(a, b);
        assert_eq!(registry.outstanding(), 2);
    }
}
