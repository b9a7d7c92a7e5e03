//! Error types for Flightload

use thiserror::Error;

/// Result type alias for Flightload operations
pub type Result<T> = std::result::Result<T, FlightloadError>;

/// Main error type shared across the workspace
#[derive(Error, Debug)]
pub enum FlightloadError {
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlightloadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
