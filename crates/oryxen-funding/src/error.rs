//! Funding aggregation error types.

use oryxen_core::Protocol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundingError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("No funding source for protocol: {0}")]
    UnsupportedProtocol(Protocol),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FundingResult<T> = Result<T, FundingError>;
