use std::sync::Arc;
use std::time::Duration;

use slotguard_core::SlotGranularity;
use slotguard_reservations::ReservationStore;
use slotguard_state::{LockStore, SlotLockManager, StateError};

use crate::config::CoordinatorConfig;
use crate::coordinator::ReservationCoordinator;
use crate::error::CoordinatorError;

/// Fluent builder for constructing a [`ReservationCoordinator`].
///
/// A [`LockStore`] and a [`ReservationStore`] must be supplied; timing
/// defaults come from [`CoordinatorConfig::default`].
pub struct CoordinatorBuilder {
    lock_store: Option<Arc<dyn LockStore>>,
    reservations: Option<Arc<dyn ReservationStore>>,
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            lock_store: None,
            reservations: None,
            config: CoordinatorConfig::default(),
        }
    }

    /// Set the lock store shared by every instance of the service.
    #[must_use]
    pub fn lock_store(mut self, store: Arc<dyn LockStore>) -> Self {
        self.lock_store = Some(store);
        self
    }

    /// Set the durable reservation store.
    #[must_use]
    pub fn reservations(mut self, store: Arc<dyn ReservationStore>) -> Self {
        self.reservations = Some(store);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.config.lock_ttl = ttl;
        self
    }

    #[must_use]
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.config.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn granularity(mut self, granularity: SlotGranularity) -> Self {
        self.config.granularity = granularity;
        self
    }

    /// Consume the builder and produce a [`ReservationCoordinator`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Configuration`] if a store is missing or
    /// the timing parameters are inconsistent.
    pub fn build(self) -> Result<ReservationCoordinator, CoordinatorError> {
        let lock_store = self
            .lock_store
            .ok_or_else(|| CoordinatorError::Configuration("lock store is required".into()))?;

        let reservations = self.reservations.ok_or_else(|| {
            CoordinatorError::Configuration("reservation store is required".into())
        })?;

        let locks =
            SlotLockManager::new(lock_store, self.config.lock_config()).map_err(|e| match e {
                StateError::InvalidConfig(msg) => CoordinatorError::Configuration(msg),
                other => CoordinatorError::Lock(other),
            })?;

        Ok(ReservationCoordinator::new(locks, reservations, self.config))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
