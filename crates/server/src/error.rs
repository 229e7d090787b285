use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use slotguard_coordinator::CoordinatorError;
use slotguard_core::RejectReason;

/// Errors that can occur when running the SlotGuard server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A coordinator-level error surfaced through the API.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// The slot could not be booked.
    #[error("slot already booked or locked by another user")]
    Conflict(RejectReason),

    /// The addressed resource does not exist for this caller.
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, retryable) = match &self {
            Self::Conflict(reason) => (StatusCode::CONFLICT, Some(reason.is_retryable())),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::Coordinator(CoordinatorError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, None)
            }
            Self::Coordinator(e) => (StatusCode::INTERNAL_SERVER_ERROR, Some(e.is_retryable())),
            Self::Config(_) | Self::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        // Backend detail goes to the log only.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "internal server error".to_owned()
        } else {
            self.to_string()
        };
        let body = match (&self, retryable) {
            (Self::Conflict(reason), Some(retryable)) => serde_json::json!({
                "error": message,
                "reason": reason.as_str(),
                "retryable": retryable,
            }),
            (_, Some(retryable)) => serde_json::json!({ "error": message, "retryable": retryable }),
            (_, None) => serde_json::json!({ "error": message }),
        };

        (status, axum::Json(body)).into_response()
    }
}
