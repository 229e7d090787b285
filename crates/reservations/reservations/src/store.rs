use async_trait::async_trait;

use slotguard_core::{RequesterId, Reservation, ReservationId, SlotKey};

use crate::error::ReservationError;

/// Durable storage for reservation rows.
///
/// Implementations must reject a second confirmed row for the same
/// [`SlotKey`] with [`ReservationError::Duplicate`], independently of any
/// lock held by the caller.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Return the confirmed reservation occupying `slot`, if any.
    /// Cancelled rows are ignored.
    async fn find_confirmed(&self, slot: &SlotKey) -> Result<Option<Reservation>, ReservationError>;

    /// Persist a new reservation.
    async fn insert(&self, reservation: &Reservation) -> Result<(), ReservationError>;

    /// Fetch a reservation by id regardless of status.
    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, ReservationError>;

    /// All reservations made by `requester`, newest slot first.
    async fn list_by_requester(
        &self,
        requester: &RequesterId,
    ) -> Result<Vec<Reservation>, ReservationError>;

    /// Mark a confirmed reservation cancelled if it belongs to `requester`.
    ///
    /// Returns `false` when no such confirmed reservation exists.
    async fn cancel(
        &self,
        id: &ReservationId,
        requester: &RequesterId,
    ) -> Result<bool, ReservationError>;
}
