//! Redis lock store backend for SlotGuard.
//!
//! Slot locks are stored as plain Redis strings keyed by
//! `{prefix}:lock:{lock name}` whose value is the owner token. Acquisition
//! uses `SET NX PX`; release runs a Lua compare-and-delete so only the
//! current owner can remove the key.
//!
//! # Lock Consistency
//!
//! | Deployment | Mutual Exclusion | Notes |
//! |------------|------------------|-------|
//! | Single instance | Strong | Full mutual exclusion guaranteed |
//! | Sentinel | Weak | Lock may be lost during failover |
//! | Cluster | Weak | Lock may be lost during failover |
//!
//! A lock lost during failover can let two requests reach the verify step
//! for the same slot; the reservation store's unique index still rejects the
//! second confirmed row.
//!
//! # Example
//!
//! ```ignore
//! use slotguard_state_redis::{RedisConfig, RedisLockStore};
//!
//! let store = RedisLockStore::new(&RedisConfig::new("redis://localhost:6379"))?;
//! ```

mod config;
mod scripts;
mod store;

pub use config::RedisConfig;
pub use store::RedisLockStore;
