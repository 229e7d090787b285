//! Named, TTL-bounded, ownership-checked mutual exclusion per slot.
//!
//! [`SlotLockManager`] turns the two primitives of a [`LockStore`] into a
//! lock per [`SlotKey`]:
//!
//! - **acquire** is a single atomic set-if-absent attempt. There is no queue and
//!   no waiting; a held slot yields [`AcquireOutcome::Busy`].
//! - **release** is a compare-and-delete on the owner token, so a holder whose
//!   TTL ran out can never delete a lock that has since been handed to
//!   someone else.
//! - the **TTL** bounds how long a crashed holder can block a slot.
//!
//! Every store round-trip is bounded by [`LockConfig::store_timeout`], which
//! must be under half the TTL so a slow store cannot silently keep a lock
//! past its advertised expiry. Callers doing work under a lock should bound
//! it by [`LockHandle::remaining`] as well.
//!
//! # Example
//!
//! ```ignore
//! let manager = SlotLockManager::new(store, LockConfig::default())?;
//! if let Some(lease) = manager.lease(&slot).await? {
//!     // critical section
//!     lease.release().await?;
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use slotguard_core::SlotKey;

use crate::error::StateError;
use crate::metrics::LockMetrics;
use crate::store::LockStore;

/// Default lock lifetime.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);

/// Default bound on a single lock store round-trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Timing parameters for a [`SlotLockManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Lifetime of an acquired lock.
    pub ttl: Duration,
    /// Bound on every store call. The critical section makes two bounded
    /// reservation store calls, so this must be under half of `ttl`.
    pub store_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LOCK_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl LockConfig {
    pub fn validate(&self) -> Result<(), StateError> {
        if self.ttl.is_zero() {
            return Err(StateError::InvalidConfig("ttl must be non-zero".into()));
        }
        if self.store_timeout.is_zero() {
            return Err(StateError::InvalidConfig(
                "store_timeout must be non-zero".into(),
            ));
        }
        if self.store_timeout.saturating_mul(2) >= self.ttl {
            return Err(StateError::InvalidConfig(format!(
                "store_timeout ({:?}) must be less than half of ttl ({:?})",
                self.store_timeout, self.ttl
            )));
        }
        Ok(())
    }
}

/// Opaque value identifying the request that holds a lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerToken(String);

impl OwnerToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An acquired slot lock.
///
/// Valid only while its deadline has not passed and the store still maps the
/// slot to this handle's owner token. The deadline is taken before the store
/// call, so it never outlives the stored entry.
#[derive(Debug, Clone)]
pub struct LockHandle {
    slot: SlotKey,
    owner: OwnerToken,
    expires_at: Instant,
}

impl LockHandle {
    pub fn slot(&self) -> &SlotKey {
        &self.slot
    }

    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left before the TTL elapses, zero if already expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Result of a single acquisition attempt.
#[derive(Debug)]
#[must_use]
pub enum AcquireOutcome {
    Acquired(LockHandle),
    /// Another owner holds an unexpired lock on the slot.
    Busy,
}

/// Result of releasing a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// The TTL had elapsed; the slot is free or owned by someone else.
    AlreadyExpired,
}

/// Slot lock manager over a shared [`LockStore`].
///
/// Cheap to clone; clones share the store connection and counters.
#[derive(Clone)]
pub struct SlotLockManager {
    store: Arc<dyn LockStore>,
    config: LockConfig,
    metrics: Arc<LockMetrics>,
}

impl fmt::Debug for SlotLockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotLockManager")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl SlotLockManager {
    /// Create a manager. Fails if `config` is inconsistent.
    pub fn new(store: Arc<dyn LockStore>, config: LockConfig) -> Result<Self, StateError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            metrics: Arc::new(LockMetrics::default()),
        })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn metrics(&self) -> &LockMetrics {
        &self.metrics
    }

    /// Try once for the lock on `slot`, stored under `owner` for `ttl`.
    pub async fn acquire(
        &self,
        slot: &SlotKey,
        owner: OwnerToken,
        ttl: Duration,
    ) -> Result<AcquireOutcome, StateError> {
        if ttl.is_zero() {
            return Err(StateError::InvalidConfig("ttl must be non-zero".into()));
        }

        let key = slot.lock_name();
        let expires_at = Instant::now() + ttl;
        let created = self
            .bounded(self.store.set_if_absent(&key, owner.as_str(), ttl))
            .await
            .inspect_err(|e| {
                if matches!(e, StateError::Timeout(_)) {
                    warn!(%slot, %owner, "lock acquire timed out; any entry written will expire via TTL");
                }
            })?;

        if created {
            self.metrics.increment_acquired();
            debug!(%slot, %owner, ?ttl, "slot lock acquired");
            Ok(AcquireOutcome::Acquired(LockHandle {
                slot: slot.clone(),
                owner,
                expires_at,
            }))
        } else {
            self.metrics.increment_busy();
            debug!(%slot, "slot lock busy");
            Ok(AcquireOutcome::Busy)
        }
    }

    /// Release `handle` with a compare-and-delete on its owner token.
    ///
    /// Consuming the handle makes a second release of the same acquisition
    /// impossible.
    pub async fn release(&self, handle: LockHandle) -> Result<ReleaseOutcome, StateError> {
        self.release_ref(&handle).await
    }

    /// Whether the store still maps the slot to this handle's owner.
    pub async fn is_held(&self, handle: &LockHandle) -> Result<bool, StateError> {
        if handle.is_expired() {
            return Ok(false);
        }
        let current = self.bounded(self.store.get(&handle.slot.lock_name())).await?;
        Ok(current.as_deref() == Some(handle.owner.as_str()))
    }

    /// Acquire `slot` with a fresh owner token and the configured TTL,
    /// wrapped in a [`SlotLease`]. Returns `None` when the slot is busy.
    pub async fn lease(&self, slot: &SlotKey) -> Result<Option<SlotLease>, StateError> {
        match self
            .acquire(slot, OwnerToken::generate(), self.config.ttl)
            .await?
        {
            AcquireOutcome::Acquired(handle) => Ok(Some(SlotLease {
                manager: self.clone(),
                handle,
                released: false,
            })),
            AcquireOutcome::Busy => Ok(None),
        }
    }

    async fn release_ref(&self, handle: &LockHandle) -> Result<ReleaseOutcome, StateError> {
        self.metrics.increment_release_attempts();
        let key = handle.slot.lock_name();
        let result = self
            .bounded(self.store.compare_and_delete(&key, handle.owner.as_str()))
            .await;

        match result {
            Ok(true) => {
                self.metrics.increment_released();
                debug!(slot = %handle.slot, owner = %handle.owner, "slot lock released");
                Ok(ReleaseOutcome::Released)
            }
            Ok(false) => {
                self.metrics.increment_stale_releases();
                warn!(
                    slot = %handle.slot,
                    owner = %handle.owner,
                    "slot lock expired before release"
                );
                Ok(ReleaseOutcome::AlreadyExpired)
            }
            Err(e) => {
                self.metrics.increment_release_errors();
                Err(e)
            }
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StateError>
    where
        F: Future<Output = Result<T, StateError>>,
    {
        let limit = self.config.store_timeout;
        tokio::time::timeout(limit, op)
            .await
            .map_err(|_| StateError::Timeout(limit))?
    }
}

/// Scoped ownership of a slot lock.
///
/// Call [`release`](Self::release) on every normal exit path. If the lease is
/// dropped while still held (a panic unwinding through the critical section,
/// or the owning task being aborted) the release is spawned onto the current
/// tokio runtime instead. Either way the acquisition is released once; the
/// TTL covers the case where neither path reaches the store.
#[derive(Debug)]
#[must_use = "dropping a lease releases it in the background"]
pub struct SlotLease {
    manager: SlotLockManager,
    handle: LockHandle,
    released: bool,
}

impl SlotLease {
    pub fn handle(&self) -> &LockHandle {
        &self.handle
    }

    pub fn slot(&self) -> &SlotKey {
        &self.handle.slot
    }

    /// Release the lock now.
    pub async fn release(mut self) -> Result<ReleaseOutcome, StateError> {
        self.released = true;
        self.manager.release_ref(&self.handle).await
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.manager.metrics.increment_dropped_leases();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                slot = %self.handle.slot,
                "slot lease dropped outside a runtime; lock will expire via TTL"
            );
            return;
        };

        let manager = self.manager.clone();
        let handle = self.handle.clone();
        runtime.spawn(async move {
            if let Err(e) = manager.release_ref(&handle).await {
                warn!(slot = %handle.slot, error = %e, "background lease release failed");
            }
        });
    }
}
