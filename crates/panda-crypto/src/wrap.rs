//! RSA-OAEP key wrapping for master-key transport.
//!
//! The vault generates an ephemeral [`WrappingKeypair`], submits the
//! public half (SPKI DER) to the key issuer, and unwraps the returned
//! bytes into a [`SecretKey`]. The private half never leaves the vault;
//! the symmetric key never travels in the clear.
//!
//! [`wrap_key`] is the issuer-side counterpart, used by the in-memory
//! issuer fake and by tests.

use rsa::{
    Oaep, RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    rand_core::CryptoRngCore,
};
use sha2::Sha256;

use crate::{
    error::CryptoError,
    keys::{KEY_SIZE, SecretKey},
};

/// RSA modulus size for wrapping keypairs.
const WRAP_KEY_BITS: usize = 2048;

/// An RSA-OAEP keypair owned by a vault instance.
pub struct WrappingKeypair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl WrappingKeypair {
    /// Generate a fresh 2048-bit keypair.
    ///
    /// # Errors
    ///
    /// Returns `KeypairGeneration` if prime generation fails.
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(rng, WRAP_KEY_BITS)
            .map_err(|e| CryptoError::KeypairGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    /// Public half as SPKI DER, the shape the key issuer accepts.
    ///
    /// # Errors
    ///
    /// Returns `SpkiEncode` if DER encoding fails.
    pub fn public_spki_der(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(self
            .public
            .to_public_key_der()
            .map_err(|e| CryptoError::SpkiEncode(e.to_string()))?
            .into_vec())
    }

    /// Unwrap issuer-wrapped bytes into a symmetric key.
    ///
    /// # Errors
    ///
    /// Returns `UnwrapFailed` for any OAEP failure and `InvalidKeyLength`
    /// if the unwrapped payload is not [`KEY_SIZE`] bytes.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<SecretKey, CryptoError> {
        let unwrapped = self
            .private
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| CryptoError::UnwrapFailed)?;

        SecretKey::from_bytes(&unwrapped)
    }
}

impl std::fmt::Debug for WrappingKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WrappingKeypair(..)")
    }
}

/// Wrap a symmetric key under an SPKI DER public key (issuer side).
///
/// # Errors
///
/// Returns `SpkiDecode` for unusable DER and `WrapFailed` if OAEP
/// encryption fails.
pub fn wrap_key<R: CryptoRngCore>(
    public_spki_der: &[u8],
    key: &SecretKey,
    rng: &mut R,
) -> Result<Vec<u8>, CryptoError> {
    let public =
        RsaPublicKey::from_public_key_der(public_spki_der).map_err(|_| CryptoError::SpkiDecode)?;

    debug_assert_eq!(key.expose().len(), KEY_SIZE);

    public
        .encrypt(rng, Oaep::new::<Sha256>(), key.expose())
        .map_err(|_| CryptoError::WrapFailed)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(0x5EED)
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let mut rng = seeded_rng();
        let keypair = WrappingKeypair::generate(&mut rng).unwrap();
        let spki = keypair.public_spki_der().unwrap();

        let key = SecretKey::from_array([0x42; 32]);
        let wrapped = wrap_key(&spki, &key, &mut rng).unwrap();
        let unwrapped = keypair.unwrap_key(&wrapped).unwrap();

        assert_eq!(unwrapped.expose(), key.expose());
    }

    #[test]
    fn unwrap_with_wrong_keypair_fails() {
        let mut rng = seeded_rng();
        let right = WrappingKeypair::generate(&mut rng).unwrap();
        let wrong = WrappingKeypair::generate(&mut rng).unwrap();

        let key = SecretKey::from_array([7; 32]);
        let wrapped = wrap_key(&right.public_spki_der().unwrap(), &key, &mut rng).unwrap();

        assert_eq!(wrong.unwrap_key(&wrapped).unwrap_err(), CryptoError::UnwrapFailed);
    }

    #[test]
    fn corrupt_wrapped_bytes_fail() {
        let mut rng = seeded_rng();
        let keypair = WrappingKeypair::generate(&mut rng).unwrap();

        let key = SecretKey::from_array([7; 32]);
        let mut wrapped =
            wrap_key(&keypair.public_spki_der().unwrap(), &key, &mut rng).unwrap();
        wrapped[10] ^= 0xFF;

        assert_eq!(keypair.unwrap_key(&wrapped).unwrap_err(), CryptoError::UnwrapFailed);
    }

    #[test]
    fn garbage_spki_is_rejected() {
        let mut rng = seeded_rng();
        let key = SecretKey::from_array([7; 32]);

        assert_eq!(
            wrap_key(b"not der", &key, &mut rng).unwrap_err(),
            CryptoError::SpkiDecode
        );
    }
}
