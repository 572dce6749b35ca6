//! Error types for oryxen-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid order side: {0}")]
    InvalidSide(String),

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
