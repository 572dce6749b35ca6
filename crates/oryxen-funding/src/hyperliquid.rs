//! Hyperliquid funding rates via the `/info` endpoint.

use crate::config::FundingConfig;
use crate::error::{FundingError, FundingResult};
use oryxen_core::{calculate_venue_projections, MarketFundingData, Protocol};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const FUNDING_LOOKBACK_MS: i64 = 24 * 60 * 60 * 1000;

/// Request type for info endpoint.
#[derive(Debug, Serialize)]
struct InfoRequest {
    #[serde(rename = "type")]
    request_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundingHistoryRequest<'a> {
    #[serde(rename = "type")]
    request_type: &'static str,
    coin: &'a str,
    start_time: i64,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    universe: Vec<UniverseEntry>,
}

#[derive(Debug, Deserialize)]
struct UniverseEntry {
    name: String,
}

/// One funding history entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HyperliquidFunding {
    pub coin: String,
    /// Hourly rate as a decimal string.
    #[serde(rename = "fundingRate")]
    pub funding_rate: String,
    #[serde(default)]
    pub premium: Option<String>,
    pub time: i64,
}

/// Client for Hyperliquid funding data.
pub struct HyperliquidFundingClient {
    client: Client,
    info_url: String,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl HyperliquidFundingClient {
    pub fn new(config: &FundingConfig) -> FundingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FundingError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            info_url: config.hyperliquid_url.clone(),
            chunk_size: config.chunk_size.max(1),
            chunk_delay: config.chunk_delay(),
        })
    }

    /// Latest funding snapshot for every listed coin with a mid price.
    ///
    /// Funding history is fetched in chunks with a pause between chunks.
    /// A coin whose history fails to load is logged and skipped.
    pub async fn fetch_all(&self) -> FundingResult<Vec<MarketFundingData>> {
        let coins = self.fetch_coins().await?;
        let prices = match self.fetch_all_mids().await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(?e, "Failed to fetch Hyperliquid mid prices");
                HashMap::new()
            }
        };

        let start_time = chrono::Utc::now().timestamp_millis() - FUNDING_LOOKBACK_MS;
        let chunks: Vec<&[String]> = coins.chunks(self.chunk_size).collect();
        let mut markets = Vec::with_capacity(coins.len());

        for (idx, chunk) in chunks.iter().enumerate() {
            let results = futures_util::future::join_all(
                chunk
                    .iter()
                    .map(|coin| self.fetch_funding_history(coin, start_time)),
            )
            .await;

            for (coin, result) in chunk.iter().zip(results) {
                let history = match result {
                    Ok(history) => history,
                    Err(e) => {
                        warn!(%coin, ?e, "Failed to fetch funding history");
                        continue;
                    }
                };
                let Some(latest) = history.last() else {
                    continue;
                };
                let Some(&price) = prices.get(coin) else {
                    debug!(%coin, "No mid price, skipping");
                    continue;
                };
                if let Some(market) = transform_market(coin, price, latest) {
                    markets.push(market);
                }
            }

            if idx + 1 < chunks.len() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        info!(count = markets.len(), "Fetched Hyperliquid funding rates");
        Ok(markets)
    }

    async fn fetch_coins(&self) -> FundingResult<Vec<String>> {
        let meta: MetaResponse = self.post(&InfoRequest { request_type: "meta" }).await?;
        Ok(meta.universe.into_iter().map(|u| u.name).collect())
    }

    /// Mid price per coin.
    pub async fn fetch_all_mids(&self) -> FundingResult<HashMap<String, f64>> {
        let mids: HashMap<String, String> = self
            .post(&InfoRequest {
                request_type: "allMids",
            })
            .await?;
        Ok(parse_mids(mids))
    }

    pub async fn fetch_funding_history(
        &self,
        coin: &str,
        start_time: i64,
    ) -> FundingResult<Vec<HyperliquidFunding>> {
        self.post(&FundingHistoryRequest {
            request_type: "fundingHistory",
            coin,
            start_time,
        })
        .await
    }

    async fn post<B, R>(&self, body: &B) -> FundingResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(&self.info_url)
            .json(body)
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
            .map_err(|e| FundingError::HttpClient(format!("Failed to parse response: {e}")))
    }
}

/// Parse `allMids` string prices, dropping unparsable or non-finite values.
pub fn parse_mids(mids: HashMap<String, String>) -> HashMap<String, f64> {
    mids.into_iter()
        .filter_map(|(coin, price)| {
            let price: f64 = price.parse().ok()?;
            price.is_finite().then_some((coin, price))
        })
        .collect()
}

/// Normalize one coin's latest funding entry.
///
/// Returns `None` for a zero price or an unparsable rate.
pub fn transform_market(
    coin: &str,
    price: f64,
    latest: &HyperliquidFunding,
) -> Option<MarketFundingData> {
    if price == 0.0 {
        return None;
    }
    let hourly: f64 = match latest.funding_rate.parse() {
        Ok(rate) if f64::is_finite(rate) => rate,
        _ => {
            warn!(%coin, rate = %latest.funding_rate, "Invalid funding rate");
            return None;
        }
    };

    let mut metadata = Map::new();
    metadata.insert("premium".to_string(), json!(latest.premium));
    metadata.insert("coin".to_string(), json!(latest.coin));

    Some(MarketFundingData {
        protocol: Protocol::Hyperliquid,
        symbol: format!("{coin}-PERP"),
        price,
        image_url: Some(image_url(coin)),
        funding_rate: hourly,
        max_leverage: None,
        projections: calculate_venue_projections(hourly),
        timestamp: latest.time,
        metadata,
    })
}

fn image_url(coin: &str) -> String {
    let token = coin.split('-').next().unwrap_or(coin).to_uppercase();
    format!("https://app.hyperliquid.xyz/coins/{token}.svg")
}
