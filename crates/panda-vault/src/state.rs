//! Vault state: one owned struct with an explicit lifecycle.
//!
//! All mutable vault state (master key, wrapping keypair, limiter and
//! idle bookkeeping) lives here and is passed by reference into the
//! command handler. Nothing is file-scope or shared between instances;
//! each vault gets its own isolated key.

use std::time::Duration;

use panda_crypto::{SecretKey, WrappingKeypair};

use crate::{limiter::RateWindow, runtime::VaultConfig};

#[derive(Debug)]
pub(crate) struct VaultState<I> {
    /// Whether the one-time init handshake has completed.
    handshaken: bool,

    /// Resident master key. `None` before derive, after clearKeys, and
    /// after an idle timeout. Dropping the option zeroizes the key.
    master_key: Option<SecretKey>,

    /// RSA keypair the master key is wrapped under in transit.
    /// Generated lazily on the first derive and kept for the lifetime
    /// of the vault so derive stays idempotent.
    wrapping: Option<WrappingKeypair>,

    /// Decrypt quota for the current window.
    limiter: RateWindow<I>,

    /// Instant of the last successful operation; arms the idle timer.
    last_activity: Option<I>,

    idle_timeout: Duration,
}

impl<I> VaultState<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    pub(crate) fn new(config: &VaultConfig) -> Self {
        Self {
            handshaken: false,
            master_key: None,
            wrapping: None,
            limiter: RateWindow::new(config.decrypt_limit, config.decrypt_window),
            last_activity: None,
            idle_timeout: config.idle_timeout,
        }
    }

    /// Complete the init handshake. Returns `false` if it already ran;
    /// the caller must ignore the repeat rather than answer it.
    pub(crate) fn complete_handshake(&mut self) -> bool {
        if self.handshaken {
            return false;
        }
        self.handshaken = true;
        true
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.handshaken
    }

    pub(crate) fn master_key(&self) -> Option<&SecretKey> {
        self.master_key.as_ref()
    }

    pub(crate) fn install_master_key(&mut self, key: SecretKey) {
        self.master_key = Some(key);
    }

    pub(crate) fn wrapping(&self) -> Option<&WrappingKeypair> {
        self.wrapping.as_ref()
    }

    pub(crate) fn install_wrapping(&mut self, keypair: WrappingKeypair) {
        self.wrapping = Some(keypair);
    }

    /// Record a successful operation, re-arming the idle timer.
    pub(crate) fn touch(&mut self, now: I) {
        self.last_activity = Some(now);
    }

    /// Take a decrypt token. `false` means the window is exhausted.
    pub(crate) fn try_decrypt_token(&mut self, now: I) -> bool {
        self.limiter.try_acquire(now)
    }

    /// Time until the idle deadline, or `None` when no key is resident.
    pub(crate) fn idle_remaining(&self, now: I) -> Option<Duration> {
        let last = self.last_activity?;
        self.master_key.as_ref()?;
        Some(self.idle_timeout.saturating_sub(now - last))
    }

    /// Zeroize the key if the idle deadline has passed. Returns whether
    /// a key was cleared. The vault remains in `Ready(no key)`, a valid
    /// state rather than an error.
    pub(crate) fn expire_if_idle(&mut self, now: I) -> bool {
        match self.idle_remaining(now) {
            Some(remaining) if remaining == Duration::ZERO => {
                self.clear_keys();
                true
            },
            _ => false,
        }
    }

    /// Drop the master key and forget limiter and idle bookkeeping.
    /// The handshake and the wrapping keypair survive: the channel stays
    /// owned by its first caller and a later derive may reuse the pair.
    pub(crate) fn clear_keys(&mut self) {
        self.master_key = None;
        self.limiter.reset();
        self.last_activity = None;
    }
}
