mod booking;
mod lock;
mod reservations;
mod server;
mod telemetry;


pub use booking::*;
pub use lock::*;
pub use reservations::*;
pub use server::*;
pub use telemetry::*;

use std::time::Duration;

use serde::Deserialize;
use slotguard_coordinator::CoordinatorConfig;

/// Top-level configuration for the SlotGuard server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct SlotGuardConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Slot lock store backend and timing.
    #[serde(default)]
    pub lock: LockStoreConfig,
    /// Reservation store backend.
    #[serde(default)]
    pub reservations: ReservationStoreConfig,
    /// Booking semantics.
    #[serde(default)]
    pub booking: BookingConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SlotGuardConfig {
    /// Coordinator timing and slot identity derived from `[lock]` and
    /// `[booking]`.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            lock_ttl: Duration::from_millis(self.lock.ttl_ms),
            store_timeout: Duration::from_millis(self.lock.store_timeout_ms),
            granularity: self.booking.granularity,
        }
    }
}
