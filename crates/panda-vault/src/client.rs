//! Host-side vault handle.
//!
//! Assigns correlation IDs, multiplexes concurrent callers over the one
//! command channel, and routes each response back to the caller that
//! issued the matching request. A response whose caller has gone away
//! (dropped future, navigation away) is discarded; the protocol
//! treats late replies to abandoned calls as safe to drop.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::{mpsc, oneshot};

use panda_proto::{VaultCommand, VaultReply, VaultRequest, VaultResponse};

use crate::{
    env::Environment,
    error::VaultError,
    issuer::KeyIssuer,
    runtime::{VaultConfig, VaultRuntime},
};

/// Channel depth for requests and responses.
const CHANNEL_CAPACITY: usize = 32;

/// Ciphertext/IV pair returned by [`VaultClient::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedText {
    /// Base64 ciphertext including the authentication tag.
    pub ciphertext: String,
    /// Base64 12-byte IV.
    pub iv: String,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<VaultReply>>>>;

/// Typed handle over the vault command channel.
///
/// Cloning is cheap; all clones share the correlation-ID counter and the
/// pending-call table.
#[derive(Clone)]
pub struct VaultClient {
    req_tx: mpsc::Sender<VaultRequest>,
    pending: PendingMap,
    next_id: Arc<AtomicU64>,
}

impl VaultClient {
    /// Wrap existing channel endpoints, spawning the response
    /// demultiplexer task.
    pub fn new(req_tx: mpsc::Sender<VaultRequest>, mut resp_rx: mpsc::Receiver<VaultResponse>) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let demux = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(resp) = resp_rx.recv().await {
                let slot = lock(&demux).remove(&resp.id);
                match slot {
                    Some(tx) => {
                        // The caller may have been abandoned between
                        // lookup and send; either way the reply is
                        // consumed exactly once.
                        let _ = tx.send(resp.reply);
                    },
                    None => tracing::debug!(id = resp.id, "discarding late vault response"),
                }
            }
        });

        Self { req_tx, pending, next_id: Arc::new(AtomicU64::new(1)) }
    }

    /// One-time channel handshake. Must complete before any other call.
    pub async fn init(&self) -> Result<(), VaultError> {
        match self.call(VaultCommand::Init).await? {
            VaultReply::Ack { .. } => Ok(()),
            VaultReply::Failed { error } => Err(error.into()),
            _ => Err(VaultError::UnexpectedReply),
        }
    }

    /// Fetch and unwrap the master key. Idempotent.
    pub async fn derive(&self) -> Result<(), VaultError> {
        match self.call(VaultCommand::Derive).await? {
            VaultReply::Ack { .. } => Ok(()),
            VaultReply::Failed { error } => Err(error.into()),
            _ => Err(VaultError::UnexpectedReply),
        }
    }

    /// Encrypt a plaintext string under the master key.
    pub async fn encrypt(&self, plain: impl Into<String>) -> Result<EncryptedText, VaultError> {
        match self.call(VaultCommand::Encrypt { plain: plain.into() }).await? {
            VaultReply::Encrypted { ciphertext, iv } => Ok(EncryptedText { ciphertext, iv }),
            VaultReply::Failed { error } => Err(error.into()),
            _ => Err(VaultError::UnexpectedReply),
        }
    }

    /// Decrypt a ciphertext produced by [`VaultClient::encrypt`].
    pub async fn decrypt(&self, ciphertext: &str, iv: &str) -> Result<String, VaultError> {
        let cmd = VaultCommand::Decrypt { cipher: ciphertext.to_string(), iv: iv.to_string() };
        match self.call(cmd).await? {
            VaultReply::Decrypted { plain } => Ok(plain),
            VaultReply::Failed { error } => Err(error.into()),
            _ => Err(VaultError::UnexpectedReply),
        }
    }

    /// Zeroize the master key and reset limiter state.
    pub async fn clear_keys(&self) -> Result<(), VaultError> {
        match self.call(VaultCommand::ClearKeys).await? {
            VaultReply::Ack { .. } => Ok(()),
            VaultReply::Failed { error } => Err(error.into()),
            _ => Err(VaultError::UnexpectedReply),
        }
    }

    async fn call(&self, cmd: VaultCommand) -> Result<VaultReply, VaultError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if self.req_tx.send(VaultRequest { id, cmd }).await.is_err() {
            lock(&self.pending).remove(&id);
            return Err(VaultError::ChannelClosed);
        }

        rx.await.map_err(|_| VaultError::ChannelClosed)
    }
}

fn lock(pending: &PendingMap) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<VaultReply>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spawn a vault runtime on its own task and return a connected client.
///
/// This is the whole wiring for a host: one isolated execution unit, one
/// typed channel, one issuer capability.
pub fn spawn_vault<E, K>(env: E, issuer: K, config: VaultConfig) -> VaultClient
where
    E: Environment,
    K: KeyIssuer,
{
    let (req_tx, req_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (resp_tx, resp_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let runtime = VaultRuntime::new(env, issuer, config, req_rx, resp_tx);
    tokio::spawn(runtime.run());

    VaultClient::new(req_tx, resp_rx)
}
