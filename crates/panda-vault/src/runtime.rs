//! The vault command loop.
//!
//! Commands arrive over an `mpsc` channel and are processed strictly one
//! at a time; the only suspension point is the key-issuer fetch inside
//! derive. The loop also owns the idle timer: when a key is resident it
//! sleeps until the idle deadline and zeroizes on expiry. Environments
//! whose timers never fire (manual test clocks) are covered by a lazy
//! expiry check at the head of every command.

use std::time::Duration;

use rand::{CryptoRng, RngCore};
use tokio::sync::mpsc;

use panda_crypto::{IV_SIZE, WrappingKeypair, aead, codec};
use panda_proto::{
    DeriveKeyRequest, DeriveKeyResponse, VaultCommand, VaultErrorCode, VaultReply, VaultRequest,
    VaultResponse,
};

use crate::{env::Environment, issuer::KeyIssuer, state::VaultState};

/// Tunable limits for a vault instance.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Inactivity span after which the master key is zeroized.
    pub idle_timeout: Duration,

    /// Maximum decrypt calls per window.
    pub decrypt_limit: u32,

    /// Fixed rate-limit window length.
    pub decrypt_window: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10 * 60),
            decrypt_limit: 100,
            decrypt_window: Duration::from_secs(60),
        }
    }
}

/// Bridges `Environment::random_bytes` into the RNG traits the RSA
/// keypair generator expects.
struct EnvRng<'a, E>(&'a E);

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.0.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.0.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.random_bytes(dest);
        Ok(())
    }
}

impl<E: Environment> CryptoRng for EnvRng<'_, E> {}

/// The isolated vault execution unit.
///
/// Owns the channel endpoints, the state, and the single issuer
/// capability. Run it on its own task with [`VaultRuntime::run`].
pub struct VaultRuntime<E: Environment, K: KeyIssuer> {
    env: E,
    issuer: K,
    state: VaultState<E::Instant>,
    rx: mpsc::Receiver<VaultRequest>,
    tx: mpsc::Sender<VaultResponse>,
}

impl<E: Environment, K: KeyIssuer> VaultRuntime<E, K> {
    /// Build a runtime around the given channel endpoints.
    pub fn new(
        env: E,
        issuer: K,
        config: VaultConfig,
        rx: mpsc::Receiver<VaultRequest>,
        tx: mpsc::Sender<VaultResponse>,
    ) -> Self {
        let state = VaultState::new(&config);
        Self { env, issuer, state, rx, tx }
    }

    /// Process commands until the request channel closes.
    ///
    /// Teardown drops the state, zeroizing any resident key.
    pub async fn run(mut self) {
        loop {
            let idle = self.state.idle_remaining(self.env.now());

            tokio::select! {
                maybe_req = self.rx.recv() => {
                    let Some(req) = maybe_req else { break };
                    if !self.process(req).await {
                        break;
                    }
                },
                () = self.env.sleep(idle.unwrap_or(Duration::ZERO)), if idle.is_some() => {
                    if self.state.expire_if_idle(self.env.now()) {
                        tracing::info!("idle timeout: master key zeroized");
                    }
                },
            }
        }

        tracing::debug!("vault runtime stopped");
    }

    /// Handle one command. Returns `false` once the response channel is
    /// gone and the runtime should stop.
    async fn process(&mut self, req: VaultRequest) -> bool {
        // Lazy expiry covers environments whose sleep never fires.
        if self.state.expire_if_idle(self.env.now()) {
            tracing::info!("idle timeout: master key zeroized");
        }

        if let VaultCommand::Init = req.cmd {
            if !self.state.complete_handshake() {
                // The channel belongs to its first caller; a repeat
                // handshake gets no answer at all.
                tracing::warn!(id = req.id, "ignoring repeated init handshake");
                return true;
            }
            return self.send(req.id, VaultReply::ack()).await;
        }

        if !self.state.is_ready() {
            return self.send_error(req.id, VaultErrorCode::NotReady).await;
        }

        match req.cmd {
            VaultCommand::Init => true, // handled above
            VaultCommand::Derive => self.handle_derive(req.id).await,
            VaultCommand::Encrypt { plain } => self.handle_encrypt(req.id, &plain).await,
            VaultCommand::Decrypt { cipher, iv } => {
                self.handle_decrypt(req.id, &cipher, &iv).await
            },
            VaultCommand::ClearKeys => {
                self.state.clear_keys();
                tracing::debug!(id = req.id, "keys cleared");
                self.send(req.id, VaultReply::ack()).await
            },
        }
    }

    async fn handle_derive(&mut self, id: u64) -> bool {
        // Idempotent: a resident key is simply re-acknowledged.
        if self.state.master_key().is_some() {
            self.state.touch(self.env.now());
            return self.send(id, VaultReply::ack()).await;
        }

        if self.state.wrapping().is_none() {
            match WrappingKeypair::generate(&mut EnvRng(&self.env)) {
                Ok(keypair) => self.state.install_wrapping(keypair),
                Err(e) => {
                    tracing::warn!(error = %e, "wrapping keypair generation failed");
                    return self.send_error(id, VaultErrorCode::DerivationFailed).await;
                },
            }
        }

        let spki = match self.state.wrapping().map(WrappingKeypair::public_spki_der) {
            Some(Ok(der)) => codec::b64_encode(&der),
            _ => return self.send_error(id, VaultErrorCode::DerivationFailed).await,
        };

        let wrapped = match self.issuer.derive_key(DeriveKeyRequest::wrapped(spki)).await {
            Ok(DeriveKeyResponse::Wrapped { wrapped_key }) => wrapped_key,
            Ok(DeriveKeyResponse::Rotating { .. }) => {
                tracing::warn!("issuer answered in rotation mode for a wrapped derive");
                return self.send_error(id, VaultErrorCode::DerivationFailed).await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "key issuer fetch failed");
                return self.send_error(id, VaultErrorCode::DerivationFailed).await;
            },
        };

        let unwrapped = codec::b64_decode(&wrapped)
            .and_then(|bytes| match self.state.wrapping() {
                Some(keypair) => keypair.unwrap_key(&bytes),
                None => Err(panda_crypto::CryptoError::UnwrapFailed),
            });

        match unwrapped {
            Ok(key) => {
                self.state.install_master_key(key);
                self.state.touch(self.env.now());
                tracing::info!("master key derived");
                self.send(id, VaultReply::ack()).await
            },
            Err(e) => {
                tracing::warn!(error = %e, "wrapped key unwrap failed");
                self.send_error(id, VaultErrorCode::DerivationFailed).await
            },
        }
    }

    async fn handle_encrypt(&mut self, id: u64, plain: &str) -> bool {
        let Some(key) = self.state.master_key() else {
            return self.send_error(id, VaultErrorCode::NoKey).await;
        };

        let mut iv = [0u8; IV_SIZE];
        self.env.random_bytes(&mut iv);

        let ciphertext = aead::seal(key, &iv, plain.as_bytes());

        self.state.touch(self.env.now());
        self.send(
            id,
            VaultReply::Encrypted {
                ciphertext: codec::b64_encode(&ciphertext),
                iv: codec::b64_encode(&iv),
            },
        )
        .await
    }

    async fn handle_decrypt(&mut self, id: u64, cipher: &str, iv: &str) -> bool {
        if self.state.master_key().is_none() {
            return self.send_error(id, VaultErrorCode::NoKey).await;
        }

        if !self.state.try_decrypt_token(self.env.now()) {
            tracing::warn!(id, "decrypt rate limit exceeded");
            return self.send_error(id, VaultErrorCode::RateLimited).await;
        }

        let opened = codec::b64_decode(cipher).and_then(|cipher_bytes| {
            let iv_bytes = codec::b64_decode(iv)?;
            match self.state.master_key() {
                Some(key) => aead::open(key, &iv_bytes, &cipher_bytes),
                None => Err(panda_crypto::CryptoError::OpenFailed),
            }
        });

        match opened.map(String::from_utf8) {
            Ok(Ok(plain)) => {
                self.state.touch(self.env.now());
                self.send(id, VaultReply::Decrypted { plain }).await
            },
            // Bad base64, bad tag, and non-UTF-8 plaintext all collapse
            // into one code; no oracle distinguishes them.
            _ => self.send_error(id, VaultErrorCode::DecryptionFailed).await,
        }
    }

    async fn send(&self, id: u64, reply: VaultReply) -> bool {
        self.tx.send(VaultResponse { id, reply }).await.is_ok()
    }

    async fn send_error(&self, id: u64, error: VaultErrorCode) -> bool {
        self.send(id, VaultReply::Failed { error }).await
    }
}
