//! HTTP client for the Pacifica REST API.

use crate::config::PacificaConfig;
use crate::error::{PacificaError, PacificaResult};
use crate::request::{
    build_bind_request, build_market_order_request, MarketOrderParams, MarketOrderPayload,
};
use oryxen_core::ClientOrderId;
use oryxen_signing::{AgentKeypair, MessageSigner};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Response to a market order.
///
/// The venue answers either `{"order_id": ..}` or wraps it as
/// `{"success": true, "data": {"order_id": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_id: Option<u64>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl OrderResponse {
    pub fn order_id(&self) -> Option<u64> {
        self.order_id.or_else(|| {
            self.data
                .as_ref()
                .and_then(|d| d.get("order_id"))
                .and_then(Value::as_u64)
        })
    }
}

/// Client for signed Pacifica operations.
pub struct PacificaClient {
    client: Client,
    config: PacificaConfig,
}

impl PacificaClient {
    pub fn new(config: PacificaConfig) -> PacificaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PacificaError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PacificaConfig {
        &self.config
    }

    /// Authorize `agent` to sign on behalf of the `master` account.
    ///
    /// The master key signs once; afterwards orders only need the agent key.
    pub async fn bind_agent_wallet(
        &self,
        master: &dyn MessageSigner,
        agent: &AgentKeypair,
    ) -> PacificaResult<Value> {
        let agent_wallet = agent.public_key_base58();
        let request = build_bind_request(
            master,
            &agent_wallet,
            now_millis(),
            self.config.expiry_window_ms,
        )?;

        info!(
            account = %request.account,
            agent_wallet = %agent_wallet,
            "Binding agent wallet"
        );
        let response: Value = self.post("/agent/bind", &request).await?;
        info!(agent_wallet = %agent_wallet, "Agent wallet bound");
        Ok(response)
    }

    /// Submit a market order for `account`, signed by `agent`.
    pub async fn create_market_order(
        &self,
        account: &str,
        agent: &dyn MessageSigner,
        params: &MarketOrderParams,
    ) -> PacificaResult<OrderResponse> {
        params.validate()?;

        let payload = MarketOrderPayload::from_params(
            params,
            self.config.default_slippage_percent,
            ClientOrderId::new(),
        );
        let client_order_id = payload.client_order_id.clone();
        let request = build_market_order_request(
            account,
            agent,
            payload,
            now_millis(),
            self.config.expiry_window_ms,
        )?;

        info!(
            symbol = %params.symbol,
            side = %params.side,
            amount = %params.amount,
            client_order_id = %client_order_id,
            "Submitting market order"
        );
        let response: OrderResponse = self.post("/orders/create_market", &request).await?;
        info!(
            client_order_id = %client_order_id,
            order_id = ?response.order_id(),
            "Market order accepted"
        );
        Ok(response)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> PacificaResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url(), path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PacificaError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PacificaError::HttpClient(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error = api_error(status.as_u16(), &text);
            warn!(%url, %error, "Pacifica request rejected");
            return Err(error);
        }

        serde_json::from_str(&text).map_err(|e| {
            PacificaError::HttpClient(format!("Failed to parse response: {e}: {text}"))
        })
    }
}

/// Map a non-2xx response to `PacificaError::Api`.
///
/// Uses the body's `error` field when present; non-JSON bodies are carried
/// verbatim.
pub fn api_error(status: u16, body: &str) -> PacificaError {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| json.to_string()),
        Err(_) => format!("non-JSON response: {body}"),
    };
    PacificaError::Api { status, message }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
