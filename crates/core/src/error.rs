use thiserror::Error;

/// A booking request or stored value failed field-level validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("duration_minutes must be between 1 and 480, got {0}")]
    Duration(u32),

    #[error("unknown reservation status: {0}")]
    UnknownStatus(String),
}
