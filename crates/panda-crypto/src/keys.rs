//! Owned key material with custody guarantees.

use zeroize::Zeroize;

use crate::{error::CryptoError, kdf};

/// Size of an AES-256-GCM key in bytes.
pub const KEY_SIZE: usize = 32;

/// A 32-byte symmetric key for AES-256-GCM.
///
/// The vault's master key is the canonical instance; rotating envelope
/// keys use the same type. The raw bytes are visible only inside this
/// crate (the AEAD and wrap modules); no API exposes them to callers,
/// no `Serialize` impl exists, and `Debug` prints a redaction.
pub struct SecretKey {
    key: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Build a key from exactly [`KEY_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyLength` for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self { key })
    }

    /// Build a key from an owned array. The array is moved, not copied
    /// from a longer-lived buffer.
    pub fn from_array(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Raw key bytes, visible only to this crate's primitive modules.
    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A non-extractable password-derivation handle.
///
/// Produced when the password envelope is opened during bootstrap: the
/// recovered plaintext password moves into the handle and is never
/// retained anywhere else. Downstream code can only run PBKDF2 over it.
pub struct PasswordKdfHandle {
    password: Vec<u8>,
}

impl PasswordKdfHandle {
    /// Take ownership of recovered password bytes.
    pub fn new(password: Vec<u8>) -> Self {
        Self { password }
    }

    /// PBKDF2-HMAC-SHA256 over the held password.
    ///
    /// # Errors
    ///
    /// Returns `OutputLength` if `out_len` is zero.
    pub fn derive_bits(
        &self,
        salt: &[u8],
        iterations: u32,
        out_len: usize,
    ) -> Result<Vec<u8>, CryptoError> {
        kdf::pbkdf2_sha256(&self.password, salt, iterations, out_len)
    }
}

impl Drop for PasswordKdfHandle {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl std::fmt::Debug for PasswordKdfHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordKdfHandle(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_requires_exact_length() {
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_ok());

        let err = SecretKey::from_bytes(&[0u8; 16]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidKeyLength { expected: 32, actual: 16 });
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = SecretKey::from_array([0xAB; 32]);
        assert_eq!(format!("{key:?}"), "SecretKey(..)");

        let handle = PasswordKdfHandle::new(b"hunter2".to_vec());
        assert_eq!(format!("{handle:?}"), "PasswordKdfHandle(..)");
    }

    #[test]
    fn kdf_handle_is_deterministic_over_held_password() {
        let a = PasswordKdfHandle::new(b"correct horse".to_vec());
        let b = PasswordKdfHandle::new(b"correct horse".to_vec());

        let bits_a = a.derive_bits(b"salt", 1000, 32).unwrap();
        let bits_b = b.derive_bits(b"salt", 1000, 32).unwrap();

        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn kdf_handle_differs_by_password() {
        let a = PasswordKdfHandle::new(b"one".to_vec());
        let b = PasswordKdfHandle::new(b"two".to_vec());

        assert_ne!(
            a.derive_bits(b"salt", 1000, 32).unwrap(),
            b.derive_bits(b"salt", 1000, 32).unwrap()
        );
    }
}
