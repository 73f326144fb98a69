//! Error types for Freefall

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum FfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Device error: {0}")]
    Device(String),
}

/// Result type alias
pub type FfResult<T> = Result<T, FfError>;
