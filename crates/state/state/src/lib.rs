//! Lock store abstraction and the slot lock manager built on it.
//!
//! Backends implement [`LockStore`] (set-if-absent with expiry and
//! compare-and-delete); [`SlotLockManager`] layers per-slot ownership, TTLs
//! and call timeouts on top.

pub mod error;
pub mod manager;
pub mod metrics;
pub mod store;
pub mod testing;

pub use error::StateError;
pub use manager::{
    AcquireOutcome, DEFAULT_LOCK_TTL, DEFAULT_STORE_TIMEOUT, LockConfig, LockHandle, OwnerToken,
    ReleaseOutcome, SlotLease, SlotLockManager,
};
pub use metrics::{LockMetrics, LockMetricsSnapshot};
pub use store::LockStore;
