use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for slot lock traffic.
///
/// Every successful acquisition is matched by exactly one release attempt,
/// so once all holders are done `acquired == release_attempts`.
#[derive(Debug, Default)]
pub struct LockMetrics {
    /// Acquisitions that returned a handle.
    pub acquired: AtomicU64,
    /// Acquisitions rejected because another owner held the slot.
    pub busy: AtomicU64,
    /// Release attempts, whatever their outcome.
    pub release_attempts: AtomicU64,
    /// Releases that deleted our own entry.
    pub released: AtomicU64,
    /// Releases that found the entry already expired or reassigned.
    pub stale_releases: AtomicU64,
    /// Releases that failed against the store; the TTL reclaims these.
    pub release_errors: AtomicU64,
    /// Leases released from `Drop` instead of an explicit release.
    pub dropped_leases: AtomicU64,
}

impl LockMetrics {
    pub fn increment_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_busy(&self) {
        self.busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_release_attempts(&self) {
        self.release_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_releases(&self) {
        self.stale_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_release_errors(&self) {
        self.release_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped_leases(&self) {
        self.dropped_leases.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> LockMetricsSnapshot {
        LockMetricsSnapshot {
            acquired: self.acquired.load(Ordering::Relaxed),
            busy: self.busy.load(Ordering::Relaxed),
            release_attempts: self.release_attempts.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            stale_releases: self.stale_releases.load(Ordering::Relaxed),
            release_errors: self.release_errors.load(Ordering::Relaxed),
            dropped_leases: self.dropped_leases.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`LockMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockMetricsSnapshot {
    pub acquired: u64,
    pub busy: u64,
    pub release_attempts: u64,
    pub released: u64,
    pub stale_releases: u64,
    pub release_errors: u64,
    pub dropped_leases: u64,
}
