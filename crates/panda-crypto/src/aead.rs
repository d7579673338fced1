//! Authenticated encryption using AES-256-GCM.
//!
//! All functions are pure: the caller provides the IV. Production callers
//! must draw IVs from a cryptographically secure RNG; tests pass fixed
//! bytes for determinism.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{error::CryptoError, keys::SecretKey};

/// AES-GCM IV size in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key` with the caller-provided IV.
///
/// The returned ciphertext includes the 16-byte authentication tag.
/// Encrypting the same plaintext under two different IVs yields two
/// different ciphertexts; the caller must never reuse an IV with the
/// same key.
#[allow(deprecated)]
pub fn seal(key: &SecretKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose()));

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(iv), plaintext) else {
        unreachable!("AES-GCM encryption cannot fail with valid inputs");
    };

    ciphertext
}

/// Decrypt and authenticate `ciphertext` under `key` and `iv`.
///
/// # Errors
///
/// Returns `OpenFailed` for a bad tag, wrong key, or corrupt ciphertext.
/// No further detail is exposed.
#[allow(deprecated)]
pub fn open(key: &SecretKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidIvLength { expected: IV_SIZE, actual: iv.len() });
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose()));

    cipher.decrypt(Nonce::from_slice(iv), ciphertext).map_err(|_| CryptoError::OpenFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(fill: u8) -> SecretKey {
        SecretKey::from_array([fill; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key(0x11);
        let iv = [0x22u8; IV_SIZE];

        let ciphertext = seal(&key, &iv, b"attack at dawn");
        let plaintext = open(&key, &iv, &ciphertext).unwrap();

        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn ciphertext_includes_tag() {
        let key = test_key(0x11);
        let iv = [0u8; IV_SIZE];

        let ciphertext = seal(&key, &iv, b"payload");

        assert_eq!(ciphertext.len(), b"payload".len() + TAG_SIZE);
    }

    #[test]
    fn different_ivs_produce_different_ciphertext() {
        let key = test_key(0x11);

        let a = seal(&key, &[0u8; IV_SIZE], b"same plaintext");
        let b = seal(&key, &[1u8; IV_SIZE], b"same plaintext");

        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_opaque() {
        let iv = [0u8; IV_SIZE];
        let ciphertext = seal(&test_key(0x11), &iv, b"secret");

        let err = open(&test_key(0x12), &iv, &ciphertext).unwrap_err();

        assert_eq!(err, CryptoError::OpenFailed);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = test_key(0x33);
        let iv = [7u8; IV_SIZE];

        let mut ciphertext = seal(&key, &iv, b"original");
        ciphertext[0] ^= 0xFF;

        assert!(open(&key, &iv, &ciphertext).is_err());
    }

    #[test]
    fn short_iv_is_a_length_error_not_a_panic() {
        let key = test_key(0x44);
        let ciphertext = seal(&key, &[0u8; IV_SIZE], b"x");

        let err = open(&key, &[0u8; 4], &ciphertext).unwrap_err();

        assert_eq!(err, CryptoError::InvalidIvLength { expected: IV_SIZE, actual: 4 });
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = test_key(0x55);
        let iv = [9u8; IV_SIZE];

        let ciphertext = seal(&key, &iv, b"");

        assert_eq!(open(&key, &iv, &ciphertext).unwrap(), b"");
    }
}
