//! Trust-authority key-set retrieval and token validation.

use std::str::FromStr;

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    jwk::{Jwk, JwkSet},
};

use crate::{claims::AttestationClaims, error::AttestError};

/// Client for the trust authority's JWKS endpoint.
///
/// Bound to one URL at construction. Fetching is the only network
/// operation in this crate; validation itself is pure.
pub struct JwksClient {
    http: reqwest::Client,
    url: String,
}

impl JwksClient {
    /// Client for the given JWKS URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), url: url.into() }
    }

    /// Fetch the authority's current key set.
    ///
    /// # Errors
    ///
    /// Returns `JwksFetchFailed` for transport errors, non-success
    /// statuses, and unparseable bodies.
    pub async fn fetch(&self) -> Result<JwkSet, AttestError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AttestError::JwksFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "trust authority rejected jwks fetch");
            return Err(AttestError::JwksFetchFailed(format!("status {}", status.as_u16())));
        }

        response.json().await.map_err(|e| AttestError::JwksFetchFailed(e.to_string()))
    }
}

/// Validate an attestation token against the key set and extract its
/// claims.
///
/// Key selection prefers the token's `kid`; with no `kid`, the most
/// recent key is used (JWKS endpoints append rotated keys, so that is
/// the last entry). The verification algorithm comes from the selected
/// key where it declares one, never from the attacker-controlled token
/// header alone.
///
/// # Errors
///
/// Returns `JwtInvalid` for every validation failure: bad signature,
/// unknown key, expiry, algorithm mismatch, or undecodable claims.
pub(crate) fn decode_claims(token: &str, keys: &JwkSet) -> Result<AttestationClaims, AttestError> {
    let header = decode_header(token).map_err(|e| AttestError::JwtInvalid(e.to_string()))?;

    let jwk = select_key(keys, header.kid.as_deref())?;
    let decoding_key =
        DecodingKey::from_jwk(jwk).map_err(|e| AttestError::JwtInvalid(e.to_string()))?;

    let algorithm = match &jwk.common.key_algorithm {
        Some(key_alg) => Algorithm::from_str(&key_alg.to_string())
            .map_err(|_| AttestError::JwtInvalid(format!("unsupported key algorithm {key_alg}")))?,
        None => header.alg,
    };

    let validation = Validation::new(algorithm);
    let data = decode::<AttestationClaims>(token, &decoding_key, &validation)
        .map_err(|e| AttestError::JwtInvalid(e.to_string()))?;

    Ok(data.claims)
}

fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk, AttestError> {
    if let Some(kid) = kid
        && let Some(jwk) = keys.find(kid)
    {
        return Ok(jwk);
    }

    keys.keys.last().ok_or_else(|| AttestError::JwtInvalid("empty jwks".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwk_set(kids: &[&str]) -> JwkSet {
        let keys: Vec<serde_json::Value> = kids
            .iter()
            .map(|kid| {
                serde_json::json!({
                    "kty": "oct",
                    "kid": kid,
                    "alg": "HS256",
                    "k": "c2VjcmV0LXNlY3JldC1zZWNyZXQtc2VjcmV0"
                })
            })
            .collect();

        serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap()
    }

    #[test]
    fn kid_match_wins_over_recency() {
        let keys = jwk_set(&["old", "new"]);

        let selected = select_key(&keys, Some("old")).unwrap();

        assert_eq!(selected.common.key_id.as_deref(), Some("old"));
    }

    #[test]
    fn no_kid_selects_most_recent_key() {
        let keys = jwk_set(&["old", "new"]);

        let selected = select_key(&keys, None).unwrap();

        assert_eq!(selected.common.key_id.as_deref(), Some("new"));
    }

    #[test]
    fn unknown_kid_falls_back_to_most_recent() {
        let keys = jwk_set(&["old", "new"]);

        let selected = select_key(&keys, Some("rotated-away")).unwrap();

        assert_eq!(selected.common.key_id.as_deref(), Some("new"));
    }

    #[test]
    fn empty_key_set_is_invalid() {
        let keys = jwk_set(&[]);

        assert!(matches!(select_key(&keys, None).unwrap_err(), AttestError::JwtInvalid(_)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = jwk_set(&["k1"]);

        assert!(matches!(
            decode_claims("not.a.jwt", &keys).unwrap_err(),
            AttestError::JwtInvalid(_)
        ));
    }
}
