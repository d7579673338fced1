//! Key derivation: PBKDF2 for passwords, HKDF for the legacy envelope
//! schedule.

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::CryptoError;

/// PBKDF2-HMAC-SHA256.
///
/// # Errors
///
/// Returns `OutputLength` if `out_len` is zero.
pub fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out_len: usize,
) -> Result<Vec<u8>, CryptoError> {
    if out_len == 0 {
        return Err(CryptoError::OutputLength(out_len));
    }

    let mut out = vec![0u8; out_len];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    Ok(out)
}

/// HKDF-SHA256 extract-and-expand.
///
/// # Errors
///
/// Returns `OutputLength` if `out_len` exceeds what HKDF-SHA256 can
/// produce (255 * 32 bytes) or is zero.
pub fn hkdf_sha256(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    out_len: usize,
) -> Result<Vec<u8>, CryptoError> {
    if out_len == 0 {
        return Err(CryptoError::OutputLength(out_len));
    }

    let hkdf = Hkdf::<Sha256>::new(salt, ikm);
    let mut out = vec![0u8; out_len];
    hkdf.expand(info, &mut out).map_err(|_| CryptoError::OutputLength(out_len))?;
    Ok(out)
}
