//! Error types for PinPin.

use thiserror::Error;

/// Common error type for PinPin.
#[derive(Error, Debug)]
pub enum PinpinError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Conflicting state (duplicate username, already used key, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage quota of the caller's plan would be exceeded.
    #[error("storage quota exceeded: {used} of {limit} bytes used")]
    QuotaExceeded {
        /// Bytes currently used.
        used: i64,
        /// Plan limit in bytes.
        limit: i64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PinpinError {
    fn from(e: sqlx::Error) -> Self {
        PinpinError::Database(e.to_string())
    }
}

/// Result type alias for PinPin operations.
pub type Result<T> = std::result::Result<T, PinpinError>;
