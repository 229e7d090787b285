use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking booking attempts and their lock traffic.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot). Once every attempt has returned,
/// `lock_acquired == lock_released + stale_releases + release_errors`.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
    /// Booking attempts received, valid or not.
    pub attempts: AtomicU64,
    /// Attempts that obtained the slot lock.
    pub lock_acquired: AtomicU64,
    /// Locks released by their holder.
    pub lock_released: AtomicU64,
    /// Locks whose TTL ran out before the holder released them.
    pub stale_releases: AtomicU64,
    /// Releases that failed against the lock store.
    pub release_errors: AtomicU64,
    /// Attempts rejected because another request held the slot lock.
    pub contended: AtomicU64,
    /// Attempts rejected because the slot already had a confirmed booking.
    pub already_booked: AtomicU64,
    /// Reservations committed.
    pub confirmed: AtomicU64,
    /// Attempts that failed on a store error or timeout.
    pub store_failures: AtomicU64,
    /// Reservations cancelled.
    pub cancellations: AtomicU64,
}

impl CoordinatorMetrics {
    pub fn increment_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lock_acquired(&self) {
        self.lock_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lock_released(&self) {
        self.lock_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_releases(&self) {
        self.stale_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_release_errors(&self) {
        self.release_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_contended(&self) {
        self.contended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_already_booked(&self) {
        self.already_booked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> CoordinatorMetricsSnapshot {
        CoordinatorMetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            lock_acquired: self.lock_acquired.load(Ordering::Relaxed),
            lock_released: self.lock_released.load(Ordering::Relaxed),
            stale_releases: self.stale_releases.load(Ordering::Relaxed),
            release_errors: self.release_errors.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            already_booked: self.already_booked.load(Ordering::Relaxed),
            confirmed: self.confirmed.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`CoordinatorMetrics`] at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorMetricsSnapshot {
    pub attempts: u64,
    pub lock_acquired: u64,
    pub lock_released: u64,
    pub stale_releases: u64,
    pub release_errors: u64,
    pub contended: u64,
    pub already_booked: u64,
    pub confirmed: u64,
    pub store_failures: u64,
    pub cancellations: u64,
}

impl CoordinatorMetricsSnapshot {
    /// Releases observed for acquired locks, whatever their outcome.
    pub fn releases_observed(&self) -> u64 {
        self.lock_released + self.stale_releases + self.release_errors
    }
}
