//! Signing error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    /// Payload cannot be rendered as canonical JSON. Caller error; not retried.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Failed to decode base58: {0}")]
    KeyDecode(#[from] bs58::decode::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Public key mismatch: expected {expected}, got {actual}")]
    PublicKeyMismatch { expected: String, actual: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SigningResult<T> = Result<T, SigningError>;
