//! Panda Vault Runtime
//!
//! An isolated execution unit that holds the user's master key and
//! performs all AES operations on behalf of the host application. The
//! host never sees key bytes; it speaks a small JSON request/response
//! protocol over an asynchronous channel, with caller-assigned
//! correlation IDs.
//!
//! # Isolation
//!
//! The runtime owns exactly one outward capability: a [`KeyIssuer`] bound
//! to a single fixed origin. It has no storage access, no access to host
//! memory, and no other network surface. Those properties are enforced
//! here by construction (the crate simply holds no such capability) and
//! must additionally be enforced by the hosting environment's
//! configuration.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --(init handshake, once)--> Ready(no key)
//!       Ready(no key) --(derive ok)-------> Ready(keyed)
//!       Ready(keyed) --(idle timeout | clearKeys)--> Ready(no key)
//! ```
//!
//! Any command before the handshake fails `NotReady`. The handshake is
//! accepted exactly once per lifetime; repeats are ignored so a second
//! caller cannot hijack the channel.
//!
//! # Resource limits
//!
//! - Decrypt calls are rate limited: at most 100 per fixed 60-second
//!   window. Rejection does not consume a token; the window resets
//!   wholesale when it rolls over.
//! - Every successful operation re-arms a 10-minute idle timer. Expiry
//!   zeroizes the master key and leaves the vault in `Ready(no key)`,
//!   which is a valid state, not an error.
//!
//! # Concurrency
//!
//! The runtime is single-threaded cooperative with respect to its
//! command queue: one command at a time, in arrival order. The only
//! suspension point is the key-issuer fetch inside `derive`. Callers may
//! abandon a pending call; the matching response is discarded by the
//! [`VaultClient`] demultiplexer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod envelope;
pub mod issuer;

mod client;
mod error;
mod limiter;
mod runtime;
mod state;

pub use client::{EncryptedText, VaultClient, spawn_vault};
pub use envelope::{BootstrapOutcome, SealedPassword, bootstrap_password_key};
pub use error::{EnvelopeError, VaultError};
pub use issuer::{HttpKeyIssuer, IssuerError, KeyIssuer, MemoryIssuer};
pub use runtime::{VaultConfig, VaultRuntime};
