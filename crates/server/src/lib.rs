//! HTTP front end for the SlotGuard booking coordinator.

pub mod api;
pub mod config;
pub mod error;
pub mod lock_factory;
pub mod reservation_factory;
pub mod telemetry;
