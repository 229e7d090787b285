use thiserror::Error;

use slotguard_core::{SlotKey, ValidationError};
use slotguard_reservations::ReservationError;
use slotguard_state::StateError;

/// Errors that can occur while coordinating a booking.
///
/// Contention and an already-booked slot are not errors; they come back as
/// [`BookingOutcome::Rejected`](slotguard_core::BookingOutcome::Rejected).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The request failed field validation before any store was touched.
    #[error("invalid booking request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// The lock store failed or timed out.
    #[error("lock error: {0}")]
    Lock(#[from] StateError),

    /// The reservation store failed or timed out.
    #[error("reservation store error: {0}")]
    Store(#[from] ReservationError),

    /// The slot lock ran out before the reservation could be committed.
    /// Nothing was written.
    #[error("slot lock on {0} expired before commit")]
    LeaseExpired(SlotKey),

    /// The coordinator was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoordinatorError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Lock(StateError::InvalidConfig(_))
            | Self::InvalidRequest(_)
            | Self::Configuration(_) => false,
            Self::Lock(_) | Self::LeaseExpired(_) => true,
            Self::Store(e) => e.is_retryable(),
        }
    }
}
