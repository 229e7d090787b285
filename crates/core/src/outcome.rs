use serde::{Deserialize, Serialize};

use crate::reservation::Reservation;

/// Why a booking attempt was turned away without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Another request currently holds the slot lock.
    Contended,
    /// A confirmed reservation already exists for the slot.
    AlreadyBooked,
}

impl RejectReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contended => "contended",
            Self::AlreadyBooked => "already_booked",
        }
    }

    /// Whether resubmitting the same request later may succeed.
    ///
    /// Contention is transient; an already-booked slot stays booked until
    /// the existing reservation is cancelled.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Contended)
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a booking attempt that did not fail with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum BookingOutcome {
    Confirmed(Reservation),
    Rejected(RejectReason),
}

impl BookingOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// The confirmed reservation, if any.
    pub fn reservation(&self) -> Option<&Reservation> {
        match self {
            Self::Confirmed(r) => Some(r),
            Self::Rejected(_) => None,
        }
    }
}
