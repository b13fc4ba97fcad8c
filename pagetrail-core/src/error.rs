//! Error types for pagetrail-core

use thiserror::Error;

/// Main error type for the pagetrail-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/delivery error
    #[error("delivery error: {0}")]
    Delivery(String),
}

/// Result type alias for pagetrail-core
pub type Result<T> = std::result::Result<T, Error>;
