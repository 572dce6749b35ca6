//! Pacifica client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacificaError {
    #[error("Pacifica API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Signing error: {0}")]
    Signing(#[from] oryxen_signing::SigningError),
}

pub type PacificaResult<T> = Result<T, PacificaError>;
