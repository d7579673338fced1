//! Buffer codecs: base64 (standard and url-safe) and hex.
//!
//! Thin wrappers over the `base64`/`hex` engines that map decode failures
//! into the crate error type so callers never unwrap foreign errors.

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};

use crate::error::CryptoError;

/// Standard base64 encode.
pub fn b64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Standard base64 decode.
///
/// # Errors
///
/// Returns `Base64` on malformed input.
pub fn b64_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(data).map_err(|_| CryptoError::Base64)
}

/// Base64url (no padding) encode. Rotating envelope keys travel in this
/// alphabet.
pub fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Base64url (no padding) decode.
///
/// # Errors
///
/// Returns `Base64` on malformed input.
pub fn b64url_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD.decode(data).map_err(|_| CryptoError::Base64)
}

/// Hex encode (lowercase).
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Hex decode.
///
/// # Errors
///
/// Returns `Hex` on malformed input.
pub fn hex_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(data).map_err(|_| CryptoError::Hex)
}

/// Hex decode into a fixed-size array.
///
/// # Errors
///
/// Returns `Hex` on malformed input or any length other than `N` bytes.
pub fn hex_decode_array<const N: usize>(data: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex_decode(data)?;
    bytes.as_slice().try_into().map_err(|_| CryptoError::Hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_roundtrip() {
        let data = b"\x00\x01\xFEpanda";
        assert_eq!(b64_decode(&b64_encode(data)).unwrap(), data);
    }

    #[test]
    fn base64url_has_no_padding() {
        let encoded = b64url_encode(b"ab");
        assert!(!encoded.contains('='));
        assert_eq!(b64url_decode(&encoded).unwrap(), b"ab");
    }

    #[test]
    fn malformed_base64_is_typed_error() {
        assert_eq!(b64_decode("!!!").unwrap_err(), CryptoError::Base64);
        assert_eq!(b64url_decode("!!!").unwrap_err(), CryptoError::Base64);
    }

    #[test]
    fn hex_roundtrip_and_rejection() {
        assert_eq!(hex_decode(&hex_encode(b"\xde\xad")).unwrap(), b"\xde\xad");
        assert_eq!(hex_decode("zz").unwrap_err(), CryptoError::Hex);
    }

    #[test]
    fn hex_array_enforces_length() {
        let ok: [u8; 2] = hex_decode_array("dead").unwrap();
        assert_eq!(ok, [0xde, 0xad]);

        assert_eq!(hex_decode_array::<4>("dead").unwrap_err(), CryptoError::Hex);
    }
}
