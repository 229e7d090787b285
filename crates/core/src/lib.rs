//! Domain types shared by every SlotGuard crate: identifiers, the
//! [`SlotKey`] that names a bookable unit, [`Reservation`] rows and the
//! [`BookingOutcome`] of a booking attempt.

pub mod error;
pub mod outcome;
pub mod reservation;
pub mod slot;
pub mod types;

pub use error::ValidationError;
pub use outcome::{BookingOutcome, RejectReason};
pub use reservation::{
    BookingRequest, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, MAX_ID_LEN, Reservation,
    ReservationStatus,
};
pub use slot::{SlotGranularity, SlotKey};
pub use types::{AnalystId, RequesterId, ReservationId};
