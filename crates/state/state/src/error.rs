use thiserror::Error;

/// Errors from lock store operations.
///
/// A contended lock is not an error; it is reported as
/// [`AcquireOutcome::Busy`](crate::AcquireOutcome::Busy).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),
}
