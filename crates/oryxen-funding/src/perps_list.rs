//! Perp listings for the supported venues via CoinGecko.
//!
//! `/derivatives` supplies the contracts, `/coins/markets` the coin images;
//! both are fetched concurrently and joined on the base symbol.

use crate::config::FundingConfig;
use crate::error::{FundingError, FundingResult};
use oryxen_core::Protocol;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const PERPETUAL: &str = "perpetual";

/// CoinGecko market names and the venue each one maps to.
pub const PERP_MARKETS: [(&str, Protocol); 3] = [
    ("Drift Protocol", Protocol::Drift),
    ("Hyperliquid (Futures)", Protocol::Hyperliquid),
    ("Flash Trade", Protocol::Flash),
];

/// One row of `/derivatives`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Derivative {
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub index_id: Option<String>,
    #[serde(default)]
    pub contract_type: String,
}

/// One row of `/coins/markets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinMarket {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A perp market listed on a supported venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpListing {
    pub name: String,
    pub protocol: Protocol,
    /// Venue name as CoinGecko spells it.
    pub market: String,
    pub image_url: Option<String>,
    pub base_asset: String,
}

/// Client for the perp listing.
pub struct PerpsListClient {
    client: Client,
    base_url: String,
}

impl PerpsListClient {
    /// The API key is read from `config.coingecko_api_key_env`; without it
    /// requests go out unauthenticated.
    pub fn new(config: &FundingConfig) -> FundingResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(key) = std::env::var(&config.coingecko_api_key_env) {
            let value = HeaderValue::from_str(key.trim())
                .map_err(|e| FundingError::HttpClient(format!("Invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        } else {
            debug!(var = %config.coingecko_api_key_env, "No CoinGecko API key set");
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| FundingError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.coingecko_url.trim_end_matches('/').to_string(),
        })
    }

    /// Perpetual contracts on the supported venues.
    ///
    /// Fails if either endpoint fails.
    pub async fn fetch_all(&self) -> FundingResult<Vec<PerpListing>> {
        let (derivatives, markets) = tokio::join!(
            self.get::<Derivative>("/derivatives", &[]),
            self.get::<CoinMarket>("/coins/markets", &[("vs_currency", "usd"), ("per_page", "250")]),
        );
        let derivatives = derivatives?;
        let markets = markets?;

        let listings = build_listings(&derivatives, &markets);
        info!(
            count = listings.len(),
            derivatives = derivatives.len(),
            "Fetched perp listings"
        );
        Ok(listings)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> FundingResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FundingError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FundingError::HttpClient(format!("Failed to read {path}: {e}")))?;
        if !status.is_success() {
            return Err(FundingError::HttpClient(format!("HTTP {status}: {body}")));
        }

        parse_array(path, &body)
    }
}

/// Parse a response that must be a JSON array.
fn parse_array<T: DeserializeOwned>(path: &str, body: &str) -> FundingResult<Vec<T>> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_array() {
        return Err(FundingError::UnexpectedResponse(format!(
            "{path}: expected a JSON array"
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn protocol_for_market(market: &str) -> Option<Protocol> {
    PERP_MARKETS
        .iter()
        .find(|(name, _)| *name == market)
        .map(|(_, protocol)| *protocol)
}

/// Keep perpetuals on supported venues and attach images by base symbol.
///
/// Image lookup is case-insensitive; when several coins share a symbol the
/// last one listed wins.
pub fn build_listings(derivatives: &[Derivative], markets: &[CoinMarket]) -> Vec<PerpListing> {
    let images: HashMap<String, &str> = markets
        .iter()
        .filter_map(|coin| Some((coin.symbol.to_lowercase(), coin.image.as_deref()?)))
        .collect();

    derivatives
        .iter()
        .filter(|d| d.contract_type == PERPETUAL)
        .filter_map(|d| {
            let protocol = protocol_for_market(&d.market)?;
            let Some(base_asset) = d.index_id.as_deref().filter(|id| !id.is_empty()) else {
                debug!(symbol = %d.symbol, "Perp without index id, skipping");
                return None;
            };
            Some(PerpListing {
                name: d.symbol.clone(),
                protocol,
                market: d.market.clone(),
                image_url: images
                    .get(&base_asset.to_lowercase())
                    .map(|url| url.to_string()),
                base_asset: base_asset.to_string(),
            })
        })
        .collect()
}
