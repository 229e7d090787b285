use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;

/// Shared key-value store offering the two atomic primitives slot locking
/// needs.
///
/// Implementations must be `Send + Sync` and safe for concurrent access from
/// every service instance. Keys are opaque lock names; backends may prefix
/// them.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `value` with the given expiry only if no unexpired entry
    /// exists. Returns `true` if this call created the entry.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, StateError>;

    /// Delete `key` only if its unexpired value equals `expected`.
    /// Returns `true` if this call removed the entry.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StateError>;

    /// Current unexpired value of `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;
}
