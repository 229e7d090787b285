use std::time::Duration;

use slotguard_core::SlotKey;

/// Errors returned by reservation store backends.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// Another confirmed reservation already occupies the slot.
    #[error("slot already has a confirmed reservation: {0}")]
    Duplicate(SlotKey),

    /// The backend failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// The call did not complete in time.
    #[error("reservation store timed out after {0:?}")]
    Timeout(Duration),
}

impl ReservationError {
    /// Transient failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Timeout(_))
    }
}
