//! Booking coordinator: acquire the slot lock, verify the slot is free,
//! commit the reservation, release the lock.

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;

pub use builder::CoordinatorBuilder;
pub use config::CoordinatorConfig;
pub use coordinator::ReservationCoordinator;
pub use error::CoordinatorError;
pub use metrics::{CoordinatorMetrics, CoordinatorMetricsSnapshot};
