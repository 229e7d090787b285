use axum::Json;
use axum::extract::State;

use super::AppState;
use super::schemas::{HealthResponse, MetricsResponse, RootEndpoints, RootResponse};

/// `GET /` -- service banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    summary = "Service info",
    responses(
        (status = 200, description = "Service name, version and useful links", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SlotGuard Booking Service".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        endpoints: RootEndpoints {
            docs: "/swagger-ui".into(),
            health: "/api/booking/health".into(),
        },
    })
}

/// `GET /api/booking/health` -- liveness check.
#[utoipa::path(
    get,
    path = "/api/booking/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        service: "booking-service".into(),
    })
}

/// `GET /metrics` -- coordinator counters as JSON.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    summary = "Booking metrics",
    description = "Lock acquisition, release and booking outcome counters since startup.",
    responses(
        (status = 200, description = "Current metric counters", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.coordinator.metrics().snapshot().into())
}
