//! Signed request bodies.
//!
//! Each body is the signed payload flattened next to the signature fields.
//! Building them is pure so the exact bytes can be checked without a server.

use crate::config::SUPPORTED_SYMBOLS;
use crate::error::{PacificaError, PacificaResult};
use oryxen_core::{ClientOrderId, OrderSide};
use oryxen_signing::{
    sign_request, MessageSigner, SignatureHeader, BIND_AGENT_WALLET, CREATE_MARKET_ORDER,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Take-profit / stop-loss leg attached to a market order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOrderConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub limit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<ClientOrderId>,
}

/// Caller-facing market order parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketOrderParams {
    pub symbol: String,
    pub amount: Decimal,
    pub side: OrderSide,
    /// Falls back to the client's configured default.
    pub slippage_percent: Option<Decimal>,
    pub reduce_only: bool,
    pub take_profit: Option<StopOrderConfig>,
    pub stop_loss: Option<StopOrderConfig>,
}

impl MarketOrderParams {
    pub fn new(symbol: impl Into<String>, amount: Decimal, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            side,
            slippage_percent: None,
            reduce_only: false,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn with_slippage(mut self, slippage_percent: Decimal) -> Self {
        self.slippage_percent = Some(slippage_percent);
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Reject symbols outside the supported set and non-positive amounts.
    pub fn validate(&self) -> PacificaResult<()> {
        if !SUPPORTED_SYMBOLS.contains(&self.symbol.as_str()) {
            return Err(PacificaError::UnsupportedSymbol(self.symbol.clone()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(PacificaError::InvalidOrder(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if let Some(slippage) = self.slippage_percent {
            if slippage < Decimal::ZERO {
                return Err(PacificaError::InvalidOrder(format!(
                    "slippage must not be negative, got {slippage}"
                )));
            }
        }
        Ok(())
    }
}

/// Signed portion of a market order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketOrderPayload {
    pub symbol: String,
    pub reduce_only: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub side: OrderSide,
    #[serde(with = "rust_decimal::serde::str")]
    pub slippage_percent: Decimal,
    pub client_order_id: ClientOrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<StopOrderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<StopOrderConfig>,
}

impl MarketOrderPayload {
    pub fn from_params(
        params: &MarketOrderParams,
        default_slippage: Decimal,
        client_order_id: ClientOrderId,
    ) -> Self {
        Self {
            symbol: params.symbol.clone(),
            reduce_only: params.reduce_only,
            amount: params.amount,
            side: params.side,
            slippage_percent: params.slippage_percent.unwrap_or(default_slippage),
            client_order_id,
            take_profit: params.take_profit.clone(),
            stop_loss: params.stop_loss.clone(),
        }
    }
}

/// `POST /orders/create_market` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateMarketOrderRequest {
    pub account: String,
    pub agent_wallet: String,
    pub signature: String,
    pub timestamp: i64,
    pub expiry_window: u64,
    #[serde(flatten)]
    pub payload: MarketOrderPayload,
}

#[derive(Debug, Clone, Serialize)]
struct BindAgentPayload<'a> {
    agent_wallet: &'a str,
}

/// `POST /agent/bind` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindAgentRequest {
    pub account: String,
    pub signature: String,
    pub timestamp: i64,
    pub expiry_window: u64,
    pub agent_wallet: String,
}

/// Sign `{agent_wallet}` with the master key.
///
/// # Errors
/// Propagates signer failures.
pub fn build_bind_request(
    master: &dyn MessageSigner,
    agent_wallet: &str,
    timestamp: i64,
    expiry_window: u64,
) -> PacificaResult<BindAgentRequest> {
    let header = SignatureHeader::with_timestamp(BIND_AGENT_WALLET, timestamp, expiry_window);
    let signed = sign_request(master, header, &BindAgentPayload { agent_wallet })?;

    Ok(BindAgentRequest {
        account: master.public_key_base58(),
        signature: signed.signature,
        timestamp: signed.header.timestamp,
        expiry_window: signed.header.expiry_window,
        agent_wallet: agent_wallet.to_string(),
    })
}

/// Sign a market order with the agent key on behalf of `account`.
///
/// # Errors
/// Propagates signer failures.
pub fn build_market_order_request(
    account: &str,
    agent: &dyn MessageSigner,
    payload: MarketOrderPayload,
    timestamp: i64,
    expiry_window: u64,
) -> PacificaResult<CreateMarketOrderRequest> {
    let header = SignatureHeader::with_timestamp(CREATE_MARKET_ORDER, timestamp, expiry_window);
    let signed = sign_request(agent, header, &payload)?;

    Ok(CreateMarketOrderRequest {
        account: account.to_string(),
        agent_wallet: agent.public_key_base58(),
        signature: signed.signature,
        timestamp: signed.header.timestamp,
        expiry_window: signed.header.expiry_window,
        payload,
    })
}
