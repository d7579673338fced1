//! Password envelope sealing and server-driven key rotation.
//!
//! The user's password is persisted by the host encrypted under a
//! rotating, server-issued symmetric key, so the vault's own key never
//! leaves its boundary and the host never stores a plaintext password.
//!
//! # Formats
//!
//! An envelope is self-describing JSON selected by an explicit numeric
//! `version` tag, never by sniffing the payload shape:
//!
//! - version 2 (current): `{version, iv, ciphertext}`; the server key is
//!   used directly.
//! - version 1 (legacy, read-only): `{version, flags, salt, iv,
//!   ciphertext}`; the AEAD key is HKDF-SHA256(server key, salt). Kept
//!   for the migration period; bootstrap always writes version 2.
//!
//! Blobs written before tagging existed carry no `version` field; the
//! tag is then inferred from the presence of `salt`, which is a
//! structural property of the format, not a guess about the payload.
//!
//! # Rotation
//!
//! Rotation is server-driven: the issuer alone decides when `oldKey`
//! and `newKey` differ; the client only executes the rotation it is
//! handed. Decrypt-with-old and re-encrypt-with-new form one atomic
//! unit: any failure yields an error and no new envelope, and the
//! caller keeps using the old envelope until a later bootstrap
//! succeeds. If two hosts bootstrap concurrently the persistence layer
//! resolves the divergent envelopes by last-write-wins; both decrypt to
//! the same password, so no data is lost.

use serde::{Deserialize, Serialize};

use panda_crypto::{IV_SIZE, PasswordKdfHandle, SecretKey, aead, codec, kdf};
use panda_proto::{DeriveKeyRequest, DeriveKeyResponse};

use crate::{env::Environment, error::EnvelopeError, issuer::KeyIssuer};

/// Legacy envelope version: HKDF-salted server key.
const VERSION_LEGACY: u8 = 1;

/// Current envelope version: direct server key.
const VERSION_CURRENT: u8 = 2;

/// HKDF info label for the legacy key schedule.
const LEGACY_INFO: &[u8] = b"panda password envelope v1";

#[derive(Deserialize)]
struct SealedPasswordWire {
    version: Option<u8>,
    flags: Option<u32>,
    salt: Option<String>,
    iv: String,
    ciphertext: String,
}

/// A password envelope: everything needed to decrypt except the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SealedPasswordWire")]
pub struct SealedPassword {
    /// Format tag; selects the decrypt path.
    pub version: u8,

    /// Reserved legacy field, carried through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,

    /// Base64 HKDF salt (legacy format only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,

    /// Base64 12-byte AEAD IV.
    pub iv: String,

    /// Base64 ciphertext including the authentication tag.
    pub ciphertext: String,
}

impl From<SealedPasswordWire> for SealedPassword {
    fn from(wire: SealedPasswordWire) -> Self {
        // Untagged pre-migration blobs: the salt field is structural to
        // the legacy format, so its presence fixes the version.
        let version = wire
            .version
            .unwrap_or(if wire.salt.is_some() { VERSION_LEGACY } else { VERSION_CURRENT });

        Self {
            version,
            flags: wire.flags,
            salt: wire.salt,
            iv: wire.iv,
            ciphertext: wire.ciphertext,
        }
    }
}

impl SealedPassword {
    /// Parse an envelope from its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns `Codec` if the blob is not structurally an envelope.
    pub fn decode(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Codec(e.to_string()))
    }

    /// Serialize for persistence by the host.
    ///
    /// # Errors
    ///
    /// Returns `Codec` if serialization fails.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Codec(e.to_string()))
    }

    /// Seal a password under a server key in the current format.
    pub fn seal_current(password: &[u8], server_key: &SecretKey, iv: [u8; IV_SIZE]) -> Self {
        let ciphertext = aead::seal(server_key, &iv, password);
        Self {
            version: VERSION_CURRENT,
            flags: None,
            salt: None,
            iv: codec::b64_encode(&iv),
            ciphertext: codec::b64_encode(&ciphertext),
        }
    }

    /// Decrypt this envelope under the given 32-byte server key,
    /// following the version tag's key schedule.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed`: wrong key generation or corrupt envelope
    ///   contents (bad base64, bad tag), for either version
    /// - `Codec`: a version this build does not understand, or a legacy
    ///   envelope with no salt
    pub fn open_with(&self, server_key: &[u8; 32]) -> Result<Vec<u8>, EnvelopeError> {
        let key = match self.version {
            VERSION_CURRENT => SecretKey::from_array(*server_key),
            VERSION_LEGACY => self.legacy_key(server_key)?,
            other => {
                return Err(EnvelopeError::Codec(format!("unsupported envelope version {other}")));
            },
        };

        let iv = codec::b64_decode(&self.iv).map_err(|_| EnvelopeError::DecryptionFailed)?;
        let ciphertext =
            codec::b64_decode(&self.ciphertext).map_err(|_| EnvelopeError::DecryptionFailed)?;

        aead::open(&key, &iv, &ciphertext).map_err(|_| EnvelopeError::DecryptionFailed)
    }

    /// Legacy key schedule: HKDF-SHA256 over the server key with the
    /// envelope's salt.
    fn legacy_key(&self, server_key: &[u8; 32]) -> Result<SecretKey, EnvelopeError> {
        let salt_b64 = self
            .salt
            .as_ref()
            .ok_or_else(|| EnvelopeError::Codec("legacy envelope without salt".to_string()))?;
        let salt = codec::b64_decode(salt_b64).map_err(|_| EnvelopeError::DecryptionFailed)?;

        let derived = kdf::hkdf_sha256(server_key, Some(&salt), LEGACY_INFO, 32)
            .map_err(|_| EnvelopeError::DecryptionFailed)?;

        SecretKey::from_bytes(&derived).map_err(|_| EnvelopeError::DecryptionFailed)
    }
}

/// Result of a successful bootstrap: the derivation handle and the
/// envelope the host must persist in place of the old one. The old
/// envelope must never be reused once this is adopted.
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// Non-extractable PBKDF2 handle over the recovered password.
    pub password_key: PasswordKdfHandle,

    /// Replacement envelope, sealed under the issuer's `newKey` in the
    /// current format.
    pub envelope: SealedPassword,
}

/// Decrypt the persisted envelope with the issuer's `oldKey` and
/// re-encrypt the password under `newKey`, as one atomic unit.
///
/// On any error the caller must not adopt a new envelope and may keep
/// using the old one until the next successful bootstrap.
///
/// # Errors
///
/// - `IssuerFailed`: the key-issuing endpoint was unreachable or
///   answered in the wrong mode
/// - `Codec`: a rotation key was not a base64url 32-byte value
/// - `DecryptionFailed`: the envelope did not open under `oldKey`
pub async fn bootstrap_password_key<E, K>(
    env: &E,
    issuer: &K,
    sealed: &SealedPassword,
) -> Result<BootstrapOutcome, EnvelopeError>
where
    E: Environment,
    K: KeyIssuer,
{
    let response = issuer
        .derive_key(DeriveKeyRequest::rotation())
        .await
        .map_err(|e| EnvelopeError::IssuerFailed(e.to_string()))?;

    let DeriveKeyResponse::Rotating { old_key, new_key } = response else {
        return Err(EnvelopeError::IssuerFailed("issuer answered in wrapped mode".to_string()));
    };

    let old_key = decode_rotation_key(&old_key)?;
    let new_key = decode_rotation_key(&new_key)?;

    let password = sealed.open_with(&old_key)?;

    let mut iv = [0u8; IV_SIZE];
    env.random_bytes(&mut iv);
    let envelope = SealedPassword::seal_current(&password, &SecretKey::from_array(new_key), iv);

    tracing::debug!(rotated = old_key != new_key, "password envelope bootstrapped");

    // The plaintext moves into the handle and is retained nowhere else.
    Ok(BootstrapOutcome { password_key: PasswordKdfHandle::new(password), envelope })
}

fn decode_rotation_key(encoded: &str) -> Result<[u8; 32], EnvelopeError> {
    let bytes = codec::b64url_decode(encoded)
        .map_err(|_| EnvelopeError::Codec("rotation key is not base64url".to_string()))?;

    bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::Codec(format!("rotation key has {} bytes, want 32", bytes.len())))
}
