//! Environment abstraction for deterministic testing.
//!
//! Decouples the vault's timers and randomness from system resources.
//! Production uses [`SystemEnv`] (real clock, OS entropy); tests use
//! [`ManualEnv`] (hand-advanced clock, seeded bytes) so idle timeouts,
//! rate windows and freshness checks are exact.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards within one execution context
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleep for the specified duration.
    ///
    /// Driver code only; protocol logic never awaits this directly.
    /// Implementations without running timers may return a future that
    /// never resolves; the vault runtime falls back to lazy expiry
    /// checks on each command.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fill the buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Wall-clock seconds since the Unix epoch.
    ///
    /// Used only where a protocol exchanges absolute timestamps
    /// (challenge freshness); everything internal runs on `now()`.
    fn wall_clock_secs(&self) -> u64;
}

/// Production environment using system time and cryptographic RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional: a vault without
/// functioning cryptographic randomness cannot operate securely, and
/// RNG failure indicates OS-level breakage.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - vault cannot operate securely");
    }

    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }
}

#[derive(Debug)]
struct ManualInner {
    elapsed: Duration,
    wall_secs: u64,
    seed: u64,
}

/// Deterministic environment with a hand-advanced clock.
///
/// `Instant` is the elapsed [`Duration`] since construction. `sleep`
/// never resolves; components relying on a firing timer must also
/// perform lazy expiry checks, which is exactly what this environment
/// exists to exercise. Random bytes come from a seeded LCG: not
/// cryptographic, but non-repeating and reproducible, which is what
/// deterministic tests need (including RSA prime search).
#[derive(Clone, Debug)]
pub struct ManualEnv {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualEnv {
    /// New environment at elapsed zero and the given wall-clock origin.
    pub fn new(wall_secs: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualInner {
                elapsed: Duration::ZERO,
                wall_secs,
                seed: 0x9E37_79B9_7F4A_7C15,
            })),
        }
    }

    /// Advance both the monotonic clock and the wall clock.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.lock();
        inner.elapsed += by;
        inner.wall_secs += by.as_secs();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for ManualEnv {
    type Instant = Duration;

    fn now(&self) -> Self::Instant {
        self.lock().elapsed
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::pending()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut inner = self.lock();
        for byte in buffer.iter_mut() {
            inner.seed =
                inner.seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            *byte = (inner.seed >> 33) as u8;
        }
    }

    fn wall_clock_secs(&self) -> u64 {
        self.lock().wall_secs
    }
}
