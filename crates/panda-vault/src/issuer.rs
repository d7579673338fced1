//! Key-issuer clients.
//!
//! The issuer is the vault's only outward capability: one fixed,
//! authenticated, CORS-restricted origin serving `POST /deriveKey`. The
//! trait seam exists so the runtime and the envelope bootstrap can be
//! exercised against [`MemoryIssuer`] without a network.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use panda_crypto::{SecretKey, codec, wrap_key};
use panda_proto::{DeriveKeyRequest, DeriveKeyResponse};

/// Errors from the key-issuing endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuerError {
    /// The request never completed (DNS, TLS, connection reset).
    #[error("issuer unreachable: {0}")]
    Unreachable(String),

    /// The issuer answered with a non-success status.
    #[error("issuer rejected request: status {0}")]
    Status(u16),

    /// The response body was not a recognizable issuance shape.
    #[error("issuer response malformed: {0}")]
    Malformed(String),
}

/// Capability to request key material from the issuing origin.
///
/// Implementations must be `Send + Sync`: the vault runtime holds the
/// issuer across its only suspension point.
#[async_trait]
pub trait KeyIssuer: Send + Sync + 'static {
    /// Execute `POST /deriveKey`.
    async fn derive_key(&self, request: DeriveKeyRequest) -> Result<DeriveKeyResponse, IssuerError>;
}

/// Production issuer client over HTTP.
///
/// Bound to exactly one endpoint at construction; there is no API to
/// point an existing client elsewhere. Authentication is a bearer token
/// supplied by the host's session layer (or an ambient cookie, in which
/// case no token is set).
pub struct HttpKeyIssuer {
    http: reqwest::Client,
    endpoint: String,
    bearer: Option<String>,
}

impl HttpKeyIssuer {
    /// Client for the given `deriveKey` endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), endpoint: endpoint.into(), bearer: None }
    }

    /// Attach a bearer token for the authenticated origin.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[async_trait]
impl KeyIssuer for HttpKeyIssuer {
    async fn derive_key(&self, request: DeriveKeyRequest) -> Result<DeriveKeyResponse, IssuerError> {
        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }

        let response =
            builder.send().await.map_err(|e| IssuerError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "key issuer rejected deriveKey");
            return Err(IssuerError::Status(status.as_u16()));
        }

        response.json().await.map_err(|e| IssuerError::Malformed(e.to_string()))
    }
}

#[derive(Debug)]
enum MemoryMode {
    /// Wrap this master key under whatever public key the caller submits.
    Wrapping([u8; 32]),
    /// Serve this rotation pair.
    Rotating { old_key: [u8; 32], new_key: [u8; 32] },
}

/// In-memory issuer for tests and simulations.
///
/// Mirrors the real endpoint's two modes and supports failure injection.
#[derive(Clone)]
pub struct MemoryIssuer {
    inner: Arc<Mutex<MemoryIssuerState>>,
}

struct MemoryIssuerState {
    mode: MemoryMode,
    fail: bool,
    calls: u32,
}

impl MemoryIssuer {
    /// Issuer that wraps `master` under submitted public keys.
    pub fn wrapping(master: [u8; 32]) -> Self {
        Self::with_mode(MemoryMode::Wrapping(master))
    }

    /// Issuer that serves a rotation pair. Pass `old_key == new_key` to
    /// model the steady state between rotations.
    pub fn rotating(old_key: [u8; 32], new_key: [u8; 32]) -> Self {
        Self::with_mode(MemoryMode::Rotating { old_key, new_key })
    }

    fn with_mode(mode: MemoryMode) -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryIssuerState { mode, fail: false, calls: 0 })) }
    }

    /// Make subsequent calls fail as unreachable.
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Number of `derive_key` calls served or rejected so far.
    pub fn calls(&self) -> u32 {
        self.lock().calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryIssuerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyIssuer for MemoryIssuer {
    async fn derive_key(&self, request: DeriveKeyRequest) -> Result<DeriveKeyResponse, IssuerError> {
        let mut state = self.lock();
        state.calls += 1;

        if state.fail {
            return Err(IssuerError::Unreachable("injected failure".to_string()));
        }

        match &state.mode {
            MemoryMode::Wrapping(master) => {
                let Some(spki_b64) = request.wrapping_public_key else {
                    return Err(IssuerError::Malformed(
                        "wrapping mode requires a public key".to_string(),
                    ));
                };
                let spki = codec::b64_decode(&spki_b64)
                    .map_err(|e| IssuerError::Malformed(e.to_string()))?;

                let key = SecretKey::from_array(*master);
                let wrapped = wrap_key(&spki, &key, &mut rand::rngs::OsRng)
                    .map_err(|e| IssuerError::Malformed(e.to_string()))?;

                Ok(DeriveKeyResponse::Wrapped { wrapped_key: codec::b64_encode(&wrapped) })
            },
            MemoryMode::Rotating { old_key, new_key } => Ok(DeriveKeyResponse::Rotating {
                old_key: codec::b64url_encode(old_key),
                new_key: codec::b64url_encode(new_key),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_issuer_serves_rotation_pair() {
        let issuer = MemoryIssuer::rotating([1; 32], [2; 32]);

        let resp = issuer.derive_key(DeriveKeyRequest::rotation()).await.unwrap();

        let DeriveKeyResponse::Rotating { old_key, new_key } = resp else {
            unreachable!("rotating issuer must answer in rotation mode");
        };
        assert_eq!(codec::b64url_decode(&old_key).unwrap(), [1u8; 32]);
        assert_eq!(codec::b64url_decode(&new_key).unwrap(), [2u8; 32]);
    }

    #[tokio::test]
    async fn memory_issuer_failure_injection() {
        let issuer = MemoryIssuer::rotating([1; 32], [1; 32]);
        issuer.set_fail(true);

        let err = issuer.derive_key(DeriveKeyRequest::rotation()).await.unwrap_err();

        assert!(matches!(err, IssuerError::Unreachable(_)));
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn wrapping_mode_requires_public_key() {
        let issuer = MemoryIssuer::wrapping([3; 32]);

        let err = issuer.derive_key(DeriveKeyRequest::rotation()).await.unwrap_err();

        assert!(matches!(err, IssuerError::Malformed(_)));
    }
}
