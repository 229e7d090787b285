//! Reservation store abstraction.
//!
//! The store is the durable source of truth for bookings. Its uniqueness
//! guarantee (one confirmed row per slot) backs up the slot lock, which only
//! serializes the check-then-insert window.

pub mod error;
pub mod store;
pub mod testing;

pub use error::ReservationError;
pub use store::ReservationStore;
