use std::time::Duration;

use slotguard_core::SlotGranularity;
use slotguard_state::{DEFAULT_LOCK_TTL, DEFAULT_STORE_TIMEOUT, LockConfig};

/// Timing and slot identity settings for a [`ReservationCoordinator`].
///
/// [`ReservationCoordinator`]: crate::ReservationCoordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Lifetime of a slot lock.
    pub lock_ttl: Duration,
    /// Bound on every lock store and reservation store call.
    pub store_timeout: Duration,
    /// Precision at which slot start times are compared.
    pub granularity: SlotGranularity,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_ttl: DEFAULT_LOCK_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            granularity: SlotGranularity::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn lock_config(&self) -> LockConfig {
        LockConfig {
            ttl: self.lock_ttl,
            store_timeout: self.store_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lock_defaults() {
        let cfg = CoordinatorConfig::default();
        assert_eq!(cfg.lock_ttl, Duration::from_secs(10));
        assert_eq!(cfg.store_timeout, Duration::from_secs(2));
        assert_eq!(cfg.granularity, SlotGranularity::Second);
        assert_eq!(cfg.lock_config(), LockConfig::default());
    }
}
