//! Attested measurement claims.

use serde::Deserialize;

use panda_crypto::codec;

use crate::error::AttestError;

/// Claims carried inside a verified attestation token.
///
/// All measurement values are hex strings as issued by the trust
/// authority; [`Measurements`] is the decoded byte form.
#[derive(Debug, Clone, Deserialize)]
pub struct AttestationClaims {
    /// Build-time measurement of the trust domain.
    pub tdx_mrtd: String,

    /// Runtime measurement register 0.
    pub tdx_rtmr0: String,
    /// Runtime measurement register 1.
    pub tdx_rtmr1: String,
    /// Runtime measurement register 2.
    pub tdx_rtmr2: String,
    /// Runtime measurement register 3.
    pub tdx_rtmr3: String,

    /// Owner-defined configuration measurement, if attested.
    #[serde(default)]
    pub tdx_mrconfigid: Option<String>,

    /// Owner measurement, if attested.
    #[serde(default)]
    pub tdx_mrowner: Option<String>,

    /// Owner configuration measurement, if attested.
    #[serde(default)]
    pub tdx_mrownerconfig: Option<String>,

    /// SHA-256 of the quote bytes, binding token to quote.
    pub quotehash: String,

    /// TCB status verdict assigned by the trust authority.
    pub tcb_status: String,

    /// Security advisories applicable to the platform, if any.
    #[serde(default)]
    pub advisory_ids: Vec<String>,
}

/// Claims decoded into fixed-width measurement bytes.
#[derive(Debug)]
pub(crate) struct Measurements {
    pub mrtd: [u8; 48],
    pub rtmr: [[u8; 48]; 4],
    pub mrconfigid: [u8; 48],
    pub mrowner: [u8; 48],
    pub mrownerconfig: [u8; 48],
    pub quotehash: [u8; 32],
}

impl TryFrom<&AttestationClaims> for Measurements {
    type Error = AttestError;

    fn try_from(claims: &AttestationClaims) -> Result<Self, Self::Error> {
        Ok(Self {
            mrtd: measurement(&claims.tdx_mrtd, "tdx_mrtd")?,
            rtmr: [
                measurement(&claims.tdx_rtmr0, "tdx_rtmr0")?,
                measurement(&claims.tdx_rtmr1, "tdx_rtmr1")?,
                measurement(&claims.tdx_rtmr2, "tdx_rtmr2")?,
                measurement(&claims.tdx_rtmr3, "tdx_rtmr3")?,
            ],
            mrconfigid: optional_measurement(claims.tdx_mrconfigid.as_deref(), "tdx_mrconfigid")?,
            mrowner: optional_measurement(claims.tdx_mrowner.as_deref(), "tdx_mrowner")?,
            mrownerconfig: optional_measurement(
                claims.tdx_mrownerconfig.as_deref(),
                "tdx_mrownerconfig",
            )?,
            quotehash: codec::hex_decode_array(&claims.quotehash)
                .map_err(|_| AttestError::JwtInvalid("quotehash is not 32-byte hex".to_string()))?,
        })
    }
}

fn measurement(value: &str, claim: &str) -> Result<[u8; 48], AttestError> {
    codec::hex_decode_array(value)
        .map_err(|_| AttestError::JwtInvalid(format!("{claim} is not 48-byte hex")))
}

/// An absent optional measurement decodes as all zeros, which the
/// composite-measurement rules treat as "not attested".
fn optional_measurement(value: Option<&str>, claim: &str) -> Result<[u8; 48], AttestError> {
    value.map_or(Ok([0u8; 48]), |v| measurement(v, claim))
}
