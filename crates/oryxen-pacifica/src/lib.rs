//! Pacifica REST client.
//!
//! Two signed operations:
//! - `bind_agent_wallet`: the master key authorizes an agent key
//! - `create_market_order`: the agent key submits an order for the account
//!
//! Signing follows `oryxen-signing`: the payload is nested under `data`,
//! keys are sorted recursively, and the base58 signature is sent alongside
//! the flattened payload.

pub mod client;
pub mod config;
pub mod error;
pub mod request;

pub use client::{api_error, OrderResponse, PacificaClient};
pub use config::{Network, PacificaConfig, MAINNET_API_URL, SUPPORTED_SYMBOLS, TESTNET_API_URL};
pub use error::{PacificaError, PacificaResult};
pub use request::{
    build_bind_request, build_market_order_request, BindAgentRequest, CreateMarketOrderRequest,
    MarketOrderParams, MarketOrderPayload, StopOrderConfig,
};
