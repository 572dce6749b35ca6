//! Drift funding rates via the public data API.

use crate::config::FundingConfig;
use crate::error::{FundingError, FundingResult};
use oryxen_core::{calculate_venue_projections, MarketFundingData, Protocol};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// Prices below this are treated as missing.
const MIN_PRICE: f64 = 1e-10;

/// One entry of `/contracts`. Numeric fields arrive as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriftContract {
    #[serde(default)]
    pub ticker_id: Option<String>,
    #[serde(default)]
    pub funding_rate: Option<Value>,
    #[serde(default)]
    pub last_price: Option<Value>,
    #[serde(default)]
    pub contract_index: Option<Value>,
    #[serde(default)]
    pub base_currency: Option<Value>,
    #[serde(default)]
    pub quote_currency: Option<Value>,
    #[serde(default)]
    pub open_interest: Option<Value>,
    #[serde(default)]
    pub index_price: Option<Value>,
    #[serde(default)]
    pub next_funding_rate: Option<Value>,
    #[serde(default)]
    pub next_funding_rate_timestamp: Option<Value>,
    #[serde(default)]
    pub high: Option<Value>,
    #[serde(default)]
    pub low: Option<Value>,
    #[serde(default)]
    pub quote_volume: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ContractsResponse {
    #[serde(default)]
    contracts: Vec<DriftContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketStats {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    margin_ratio_initial: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    markets: Vec<MarketStats>,
}

/// Client for Drift funding data.
pub struct DriftFundingClient {
    client: Client,
    base_url: String,
}

impl DriftFundingClient {
    pub fn new(config: &FundingConfig) -> FundingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FundingError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.drift_url.trim_end_matches('/').to_string(),
        })
    }

    /// Funding snapshot for every valid perp contract.
    ///
    /// Contracts and leverage stats are fetched concurrently; missing stats
    /// only leave `max_leverage` empty.
    pub async fn fetch_all(&self) -> FundingResult<Vec<MarketFundingData>> {
        let (contracts, leverage) = tokio::join!(self.fetch_contracts(), self.fetch_max_leverage());

        let contracts = contracts?;
        let leverage = leverage.unwrap_or_else(|e| {
            warn!(?e, "Failed to fetch Drift max leverage");
            HashMap::new()
        });

        let now = chrono::Utc::now().timestamp_millis();
        let markets: Vec<MarketFundingData> = contracts
            .iter()
            .filter_map(|c| transform_contract(c, &leverage, now))
            .collect();

        info!(
            count = markets.len(),
            contracts = contracts.len(),
            "Fetched Drift funding rates"
        );
        Ok(markets)
    }

    pub async fn fetch_contracts(&self) -> FundingResult<Vec<DriftContract>> {
        let response: ContractsResponse = self.get("/contracts").await?;
        Ok(response.contracts)
    }

    /// Ticker -> max leverage, from `/stats/markets`.
    pub async fn fetch_max_leverage(&self) -> FundingResult<HashMap<String, u32>> {
        let response: StatsResponse = self.get("/stats/markets").await?;
        Ok(max_leverage_map(&response.markets))
    }

    async fn get<R>(&self, path: &str) -> FundingResult<R>
    where
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FundingError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FundingError::HttpClient(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| FundingError::HttpClient(format!("Failed to parse {path}: {e}")))
    }
}

fn max_leverage_map(markets: &[MarketStats]) -> HashMap<String, u32> {
    markets
        .iter()
        .filter_map(|m| {
            let symbol = m.symbol.as_ref().filter(|s| !s.is_empty())?;
            let ratio = m.margin_ratio_initial.filter(|r| r.is_finite() && *r > 0.0)?;
            Some((symbol.clone(), (1.0 / ratio).floor() as u32))
        })
        .collect()
}

/// Read a number that may be encoded as a JSON string.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Normalize one contract.
///
/// Drops contracts without a ticker, with a missing or non-finite rate or
/// price, or with a price of (almost) zero.
pub fn transform_contract(
    contract: &DriftContract,
    leverage: &HashMap<String, u32>,
    now_ms: i64,
) -> Option<MarketFundingData> {
    let ticker = contract.ticker_id.as_deref().filter(|t| !t.is_empty())?;

    let Some(funding_rate) = contract.funding_rate.as_ref().and_then(as_number) else {
        warn!(%ticker, "Invalid funding rate");
        return None;
    };
    let Some(price) = contract.last_price.as_ref().and_then(as_number) else {
        warn!(%ticker, "Invalid price");
        return None;
    };
    if price.abs() < MIN_PRICE {
        return None;
    }

    let mut metadata = Map::new();
    let mut put = |key: &str, value: &Option<Value>| {
        metadata.insert(key.to_string(), value.clone().unwrap_or(Value::Null));
    };
    put("contractIndex", &contract.contract_index);
    put("baseCurrency", &contract.base_currency);
    put("quoteCurrency", &contract.quote_currency);
    put("openInterest", &contract.open_interest);
    put("indexPrice", &contract.index_price);
    put("nextFundingRate", &contract.next_funding_rate);
    put("nextFundingRateTimestamp", &contract.next_funding_rate_timestamp);
    put("high24h", &contract.high);
    put("low24h", &contract.low);
    put("volume24h", &contract.quote_volume);

    Some(MarketFundingData {
        protocol: Protocol::Drift,
        symbol: ticker.to_string(),
        price,
        image_url: Some(image_url(ticker)),
        funding_rate,
        max_leverage: leverage.get(ticker).copied(),
        projections: calculate_venue_projections(funding_rate),
        timestamp: now_ms,
        metadata,
    })
}

fn image_url(ticker: &str) -> String {
    let symbol = ticker.split('-').next().unwrap_or(ticker).to_lowercase();
    format!(
        "https://drift-public.s3.eu-central-1.amazonaws.com/assets/icons/markets/{symbol}.svg"
    )
}
