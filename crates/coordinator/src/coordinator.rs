use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use slotguard_core::{
    BookingOutcome, BookingRequest, RejectReason, RequesterId, Reservation, ReservationId,
    SlotKey,
};
use slotguard_reservations::{ReservationError, ReservationStore};
use slotguard_state::{LockHandle, ReleaseOutcome, SlotLease, SlotLockManager};

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::metrics::CoordinatorMetrics;

/// Books slots so that no two confirmed reservations ever share a
/// [`SlotKey`], across any number of concurrent requests and service
/// instances sharing the same lock store.
///
/// Each attempt runs: acquire the slot lock, look for a confirmed
/// reservation, insert a new one if the slot is free, release the lock. The
/// release happens on every exit from the critical section, successful or
/// not. Construct with [`CoordinatorBuilder`](crate::CoordinatorBuilder).
#[derive(Clone)]
pub struct ReservationCoordinator {
    locks: SlotLockManager,
    reservations: Arc<dyn ReservationStore>,
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
}

impl std::fmt::Debug for ReservationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationCoordinator")
            .field("locks", &self.locks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReservationCoordinator {
    pub(crate) fn new(
        locks: SlotLockManager,
        reservations: Arc<dyn ReservationStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            locks,
            reservations,
            config,
            metrics: Arc::new(CoordinatorMetrics::default()),
        }
    }

    /// Attempt to book the slot named by `request`.
    ///
    /// Contention and an already-booked slot are returned as
    /// [`BookingOutcome::Rejected`]; only validation, store failures and
    /// timeouts are errors. Resubmitting a request after a rejection is safe:
    /// the verify step sees whatever the earlier attempt committed.
    #[instrument(
        name = "coordinator.book",
        skip(self, request),
        fields(
            requester = %request.requester_id,
            analyst = %request.analyst_id,
            slot_time = %request.slot_time,
        )
    )]
    pub async fn book(&self, request: BookingRequest) -> Result<BookingOutcome, CoordinatorError> {
        self.metrics.increment_attempts();
        request.validate()?;

        let slot = request.slot_key(self.config.granularity);

        let Some(lease) = self.locks.lease(&slot).await? else {
            self.metrics.increment_contended();
            debug!(%slot, "slot contended");
            return Ok(BookingOutcome::Rejected(RejectReason::Contended));
        };
        self.metrics.increment_lock_acquired();

        let result = self.verify_and_commit(&slot, lease.handle(), &request).await;
        self.release(lease).await;

        match &result {
            Ok(BookingOutcome::Confirmed(reservation)) => {
                self.metrics.increment_confirmed();
                info!(%slot, reservation = %reservation.id, "slot booked");
            }
            Ok(BookingOutcome::Rejected(_)) => {
                self.metrics.increment_already_booked();
                debug!(%slot, "slot already booked");
            }
            Err(e) => {
                self.metrics.increment_store_failures();
                warn!(%slot, error = %e, "booking failed");
            }
        }

        result
    }

    /// Verify the slot is free and insert the reservation. Runs only while
    /// `handle` is live: both store calls are cut off at its deadline and the
    /// insert is skipped once it has passed.
    async fn verify_and_commit(
        &self,
        slot: &SlotKey,
        handle: &LockHandle,
        request: &BookingRequest,
    ) -> Result<BookingOutcome, CoordinatorError> {
        if let Some(existing) = self
            .bounded_by(handle, self.reservations.find_confirmed(slot))
            .await?
        {
            debug!(%slot, existing = %existing.id, "confirmed reservation found");
            return Ok(BookingOutcome::Rejected(RejectReason::AlreadyBooked));
        }

        if handle.is_expired() {
            warn!(%slot, "slot lock expired before commit");
            return Err(CoordinatorError::LeaseExpired(slot.clone()));
        }

        let reservation = Reservation::confirmed(
            slot,
            request.requester_id.clone(),
            request.duration_minutes,
        );

        match self
            .bounded_by(handle, self.reservations.insert(&reservation))
            .await
        {
            Ok(()) => Ok(BookingOutcome::Confirmed(reservation)),
            Err(ReservationError::Duplicate(_)) => {
                // The store's own constraint caught a booking the lock did
                // not serialize, e.g. after a TTL expired mid-commit.
                warn!(%slot, "reservation store rejected duplicate confirmed booking");
                Ok(BookingOutcome::Rejected(RejectReason::AlreadyBooked))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the lease and record what happened. Never fails: the outcome
    /// of the booking is already decided.
    async fn release(&self, lease: SlotLease) {
        let slot = lease.slot().clone();
        match lease.release().await {
            Ok(ReleaseOutcome::Released) => self.metrics.increment_lock_released(),
            Ok(ReleaseOutcome::AlreadyExpired) => self.metrics.increment_stale_releases(),
            Err(e) => {
                self.metrics.increment_release_errors();
                warn!(%slot, error = %e, "slot lock release failed; TTL will reclaim it");
            }
        }
    }

    /// All reservations made by `requester`, newest slot first.
    pub async fn list_for_requester(
        &self,
        requester: &RequesterId,
    ) -> Result<Vec<Reservation>, CoordinatorError> {
        Ok(self
            .bounded(self.reservations.list_by_requester(requester))
            .await?)
    }

    /// Fetch a single reservation by id.
    pub async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, CoordinatorError> {
        Ok(self.bounded(self.reservations.get(id)).await?)
    }

    /// Cancel a confirmed reservation owned by `requester`.
    ///
    /// Returns `false` if there is no confirmed reservation with that id
    /// belonging to `requester`.
    #[instrument(name = "coordinator.cancel", skip_all, fields(%id, %requester))]
    pub async fn cancel(
        &self,
        id: &ReservationId,
        requester: &RequesterId,
    ) -> Result<bool, CoordinatorError> {
        let cancelled = self
            .bounded(self.reservations.cancel(id, requester))
            .await?;
        if cancelled {
            self.metrics.increment_cancellations();
            info!("reservation cancelled");
        } else {
            debug!("no matching confirmed reservation");
        }
        Ok(cancelled)
    }

    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    pub fn lock_manager(&self) -> &SlotLockManager {
        &self.locks
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, ReservationError>
    where
        F: Future<Output = Result<T, ReservationError>>,
    {
        let limit = self.config.store_timeout;
        tokio::time::timeout(limit, op)
            .await
            .map_err(|_| ReservationError::Timeout(limit))?
    }

    /// Like [`bounded`](Self::bounded), but never past the lock deadline.
    async fn bounded_by<T, F>(&self, handle: &LockHandle, op: F) -> Result<T, ReservationError>
    where
        F: Future<Output = Result<T, ReservationError>>,
    {
        let limit = self.config.store_timeout.min(handle.remaining());
        tokio::time::timeout(limit, op)
            .await
            .map_err(|_| ReservationError::Timeout(limit))?
    }
}
