//! Quote decoding and identity extraction.

use panda_crypto::{codec, hash};

use crate::error::AttestError;

/// Byte range of the quote's embedded user-data region.
const USER_DATA_RANGE: std::ops::Range<usize> = 28..48;

/// Decode the hex quote supplied by the host.
pub(crate) fn decode_quote(quote_hex: &str) -> Result<Vec<u8>, AttestError> {
    codec::hex_decode(quote_hex).map_err(|_| AttestError::Codec("quote is not hex".to_string()))
}

/// Device identity: `SHA-256` over the quote's user-data region.
pub(crate) fn device_id(quote: &[u8]) -> Result<[u8; 32], AttestError> {
    if quote.len() < USER_DATA_RANGE.end {
        return Err(AttestError::QuoteTooShort { actual: quote.len() });
    }

    Ok(hash::sha256(&quote[USER_DATA_RANGE]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_hashes_the_user_data_region() {
        let mut quote = vec![0u8; 64];
        quote[28..48].copy_from_slice(&[0xAB; 20]);

        let id = device_id(&quote).unwrap();

        assert_eq!(id, hash::sha256(&[0xAB; 20]));
    }

    #[test]
    fn device_id_ignores_bytes_outside_the_region() {
        let mut a = vec![0u8; 64];
        let mut b = vec![1u8; 64];
        a[28..48].copy_from_slice(&[0xCD; 20]);
        b[28..48].copy_from_slice(&[0xCD; 20]);

        assert_eq!(device_id(&a).unwrap(), device_id(&b).unwrap());
    }

    #[test]
    fn short_quote_is_rejected() {
        let err = device_id(&[0u8; 47]).unwrap_err();

        assert_eq!(err, AttestError::QuoteTooShort { actual: 47 });
    }

    #[test]
    fn non_hex_quote_is_a_codec_error() {
        assert!(matches!(decode_quote("zzzz").unwrap_err(), AttestError::Codec(_)));
    }
}
