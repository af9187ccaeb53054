//! Error types for service model loading

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Model loading error types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Invalid service model: {0}")]
    InvalidFormat(String),

    #[error("Shape not found in model: {0}")]
    MissingShape(String),

    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
