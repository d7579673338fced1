//! Verdict assembly: quote binding, register replay, composite
//! measurements.

use jsonwebtoken::jwk::JwkSet;

use panda_crypto::{codec, hash};
use panda_proto::EventLogEntry;

use crate::{
    claims::Measurements,
    error::AttestError,
    jwks::{JwksClient, decode_claims},
    quote::{decode_quote, device_id},
    replay::{extract_app_info, replay_event_log},
};

/// The verified measurement verdict.
///
/// Internally consistent and signed by the trust authority, nothing
/// more. Whether these measurements are *trusted* is allow-list policy
/// owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    /// Application identity from the event log, hex.
    pub app_id: String,

    /// `SHA-256(mrtd || rtmr0 || rtmr1 || rtmr2 || SHA-256(key_provider))`, hex.
    pub mr_system: String,

    /// `SHA-256(mrtd || rtmr0..3 [|| configid || owner || ownerconfig])`, hex.
    pub mr_aggregated: String,

    /// `SHA-256(mrtd || rtmr1 || rtmr2)`, hex.
    pub mr_image: String,

    /// OS image hash from the event log, hex as logged.
    pub os_image_hash: String,

    /// Workload compose hash from the event log, hex as logged.
    pub compose_hash: String,

    /// `SHA-256` of the quote's user-data region, hex.
    pub device_id: String,

    /// Instance identity from the event log, hex as logged.
    pub instance_id: String,

    /// TCB status carried from the verified token.
    pub tcb_status: String,

    /// Applicable security advisories carried from the verified token.
    pub advisory_ids: Vec<String>,
}

/// Verify a quote, token and event log against a known key set.
///
/// Pure with respect to I/O: the caller supplies the key set (see
/// [`AttestationVerifier`] for the fetching variant). See the crate
/// docs for the verification steps.
///
/// # Errors
///
/// Every check fails closed; see [`AttestError`] for the taxonomy.
pub fn verify_attestation(
    quote_hex: &str,
    token: &str,
    event_log: &[EventLogEntry],
    keys: &JwkSet,
) -> Result<AttestationResult, AttestError> {
    let claims = decode_claims(token, keys)?;
    let measurements = Measurements::try_from(&claims)?;

    let quote = decode_quote(quote_hex)?;
    if hash::sha256(&quote) != measurements.quotehash {
        return Err(AttestError::QuoteHashMismatch);
    }

    let device = device_id(&quote)?;

    let registers = replay_event_log(event_log)?;
    for (index, register) in registers.iter().enumerate() {
        if *register != measurements.rtmr[index] {
            tracing::debug!(index, "event log replay diverged from attested register");
            return Err(AttestError::RegisterMismatch { index });
        }
    }

    let info = extract_app_info(event_log)?;

    let result = AttestationResult {
        app_id: info.app_id,
        mr_system: codec::hex_encode(&mr_system(&measurements, &info.key_provider)),
        mr_aggregated: codec::hex_encode(&mr_aggregated(&measurements)),
        mr_image: codec::hex_encode(&mr_image(&measurements)),
        os_image_hash: info.os_image_hash,
        compose_hash: info.compose_hash,
        device_id: codec::hex_encode(&device),
        instance_id: info.instance_id,
        tcb_status: claims.tcb_status,
        advisory_ids: claims.advisory_ids,
    };

    tracing::info!(app_id = %result.app_id, tcb = %result.tcb_status, "attestation verified");
    Ok(result)
}

/// Verifier bound to a trust authority's JWKS endpoint.
pub struct AttestationVerifier {
    jwks: JwksClient,
}

impl AttestationVerifier {
    /// Verifier fetching keys from the given JWKS URL.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self { jwks: JwksClient::new(jwks_url) }
    }

    /// Fetch the current key set and verify.
    ///
    /// # Errors
    ///
    /// `JwksFetchFailed` for retrieval problems, otherwise as
    /// [`verify_attestation`].
    pub async fn verify(
        &self,
        quote_hex: &str,
        token: &str,
        event_log: &[EventLogEntry],
    ) -> Result<AttestationResult, AttestError> {
        let keys = self.jwks.fetch().await?;
        verify_attestation(quote_hex, token, event_log, &keys)
    }
}

/// `mr_aggregated`: mrtd and all four registers, plus the owner/config
/// measurements when any of them is attested (non-zero).
fn mr_aggregated(m: &Measurements) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(48 * 8);
    preimage.extend_from_slice(&m.mrtd);
    for register in &m.rtmr {
        preimage.extend_from_slice(register);
    }

    let owner_attested = [m.mrconfigid, m.mrowner, m.mrownerconfig]
        .iter()
        .any(|measurement| measurement.iter().any(|&byte| byte != 0));
    if owner_attested {
        preimage.extend_from_slice(&m.mrconfigid);
        preimage.extend_from_slice(&m.mrowner);
        preimage.extend_from_slice(&m.mrownerconfig);
    }

    hash::sha256(&preimage)
}

/// `mr_system`: the platform measurements bound to the key-provider
/// identity.
fn mr_system(m: &Measurements, key_provider: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(48 * 4 + 32);
    preimage.extend_from_slice(&m.mrtd);
    preimage.extend_from_slice(&m.rtmr[0]);
    preimage.extend_from_slice(&m.rtmr[1]);
    preimage.extend_from_slice(&m.rtmr[2]);
    preimage.extend_from_slice(&hash::sha256(key_provider));
    hash::sha256(&preimage)
}

/// `mr_image`: the measurements that identify the OS image alone.
fn mr_image(m: &Measurements) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(48 * 3);
    preimage.extend_from_slice(&m.mrtd);
    preimage.extend_from_slice(&m.rtmr[1]);
    preimage.extend_from_slice(&m.rtmr[2]);
    hash::sha256(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurements() -> Measurements {
        Measurements {
            mrtd: [1; 48],
            rtmr: [[2; 48], [3; 48], [4; 48], [5; 48]],
            mrconfigid: [0; 48],
            mrowner: [0; 48],
            mrownerconfig: [0; 48],
            quotehash: [0; 32],
        }
    }

    #[test]
    fn aggregated_excludes_owner_fields_when_all_zero() {
        let m = measurements();

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&[1; 48]);
        preimage.extend_from_slice(&[2; 48]);
        preimage.extend_from_slice(&[3; 48]);
        preimage.extend_from_slice(&[4; 48]);
        preimage.extend_from_slice(&[5; 48]);

        assert_eq!(mr_aggregated(&m), hash::sha256(&preimage));
    }

    #[test]
    fn aggregated_includes_all_owner_fields_when_any_nonzero() {
        let mut m = measurements();
        m.mrowner = [9; 48];

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&[1; 48]);
        preimage.extend_from_slice(&[2; 48]);
        preimage.extend_from_slice(&[3; 48]);
        preimage.extend_from_slice(&[4; 48]);
        preimage.extend_from_slice(&[5; 48]);
        preimage.extend_from_slice(&[0; 48]); // configid rides along
        preimage.extend_from_slice(&[9; 48]);
        preimage.extend_from_slice(&[0; 48]); // ownerconfig rides along

        assert_eq!(mr_aggregated(&m), hash::sha256(&preimage));
    }

    #[test]
    fn system_binds_key_provider_hash() {
        let m = measurements();

        let with_a = mr_system(&m, b"provider-a");
        let with_b = mr_system(&m, b"provider-b");

        assert_ne!(with_a, with_b);
    }

    #[test]
    fn image_ignores_rtmr0_and_rtmr3() {
        let mut m = measurements();
        let baseline = mr_image(&m);

        m.rtmr[0] = [0xEE; 48];
        m.rtmr[3] = [0xFF; 48];
        assert_eq!(mr_image(&m), baseline);

        m.rtmr[1] = [0xAA; 48];
        assert_ne!(mr_image(&m), baseline);
    }
}
