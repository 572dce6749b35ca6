//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] oryxen_ws::WsError),

    #[error("Signing error: {0}")]
    Signing(#[from] oryxen_signing::SigningError),

    #[error("Pacifica error: {0}")]
    Pacifica(#[from] oryxen_pacifica::PacificaError),

    #[error("Funding error: {0}")]
    Funding(#[from] oryxen_funding::FundingError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] oryxen_telemetry::TelemetryError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] oryxen_core::CoreError),

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type AppResult<T> = Result<T, AppError>;
