use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use slotguard_coordinator::CoordinatorMetricsSnapshot;
use slotguard_core::RejectReason;

/// Identifies the caller on read and cancel endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// The requesting user.
    #[param(example = "test-user-123")]
    pub user_id: String,
}

/// Generic error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "Booking not found")]
    pub error: String,
    /// Whether resubmitting the request may succeed. Absent for client errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

/// Body returned with `409 Conflict` when a slot cannot be booked.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConflictResponse {
    #[schema(example = "slot already booked or locked by another user")]
    pub error: String,
    /// `contended` when another request holds the slot lock, `already_booked`
    /// when a confirmed reservation exists.
    pub reason: RejectReason,
    /// `true` only for contention.
    pub retryable: bool,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Booking cancelled successfully")]
    pub message: String,
}

/// Booking service liveness.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "booking-service")]
    pub service: String,
}

/// Links advertised by the service root.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootEndpoints {
    #[schema(example = "/swagger-ui")]
    pub docs: String,
    #[schema(example = "/api/booking/health")]
    pub health: String,
}

/// Service banner returned by `GET /`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    #[schema(example = "SlotGuard Booking Service")]
    pub message: String,
    pub version: String,
    pub endpoints: RootEndpoints,
}

/// Booking coordinator counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Booking attempts received, including invalid ones.
    #[schema(example = 120)]
    pub attempts: u64,
    /// Slot locks acquired.
    #[schema(example = 100)]
    pub lock_acquired: u64,
    /// Slot locks released by their holder.
    #[schema(example = 99)]
    pub lock_released: u64,
    /// Releases that found the lock already expired or taken over.
    #[schema(example = 1)]
    pub stale_releases: u64,
    /// Releases that failed at the lock store.
    #[schema(example = 0)]
    pub release_errors: u64,
    /// Attempts rejected because the slot lock was held.
    #[schema(example = 20)]
    pub contended: u64,
    /// Attempts rejected because the slot was already booked.
    #[schema(example = 60)]
    pub already_booked: u64,
    /// Reservations confirmed.
    #[schema(example = 40)]
    pub confirmed: u64,
    /// Attempts that failed with a store error or timeout.
    #[schema(example = 0)]
    pub store_failures: u64,
    /// Reservations cancelled.
    #[schema(example = 3)]
    pub cancellations: u64,
}

impl From<CoordinatorMetricsSnapshot> for MetricsResponse {
    fn from(snap: CoordinatorMetricsSnapshot) -> Self {
        Self {
            attempts: snap.attempts,
            lock_acquired: snap.lock_acquired,
            lock_released: snap.lock_released,
            stale_releases: snap.stale_releases,
            release_errors: snap.release_errors,
            contended: snap.contended,
            already_booked: snap.already_booked,
            confirmed: snap.confirmed,
            store_failures: snap.store_failures,
            cancellations: snap.cancellations,
        }
    }
}
