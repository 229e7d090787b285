use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use slotguard_state::error::StateError;
use slotguard_state::store::LockStore;

/// Internal entry representing a held lock.
#[derive(Debug, Clone)]
struct LockEntry {
    owner: String,
    expires_at: Instant,
}

impl LockEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`LockStore`] backed by a [`DashMap`].
///
/// Only shared within one process, so it serializes slot locks across tasks
/// but not across service instances. Expiry is lazy: an expired entry is
/// treated as absent and evicted by the next write to the same key.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    locks: Arc<DashMap<String, LockEntry>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let entry = LockEntry {
            owner: value.to_owned(),
            expires_at: Instant::now() + ttl,
        };

        // The shard lock held by `entry` makes check and insert atomic.
        match self.locks.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(entry);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StateError> {
        let removed = self
            .locks
            .remove_if(key, |_, entry| entry.owner == expected && !entry.is_expired());
        if removed.is_none() {
            self.locks.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(removed.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self
            .locks
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.owner.clone()))
    }
}
