//! Error types for the rating pipeline
//!
//! Classification and the rating fold are total and never fail; these errors
//! only surface at the configuration and persistence boundaries.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Persistence write failed: {message}")]
    PersistenceFailed { message: String },

    #[error("Replay incomplete: {failed_writes} write(s) failed, re-run the full replay")]
    ReplayIncomplete { failed_writes: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}
