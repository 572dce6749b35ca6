//! Funding source configuration (`[funding]` section).

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const HYPERLIQUID_INFO_URL: &str = "https://api.hyperliquid.xyz/info";
pub const DRIFT_DATA_API_URL: &str = "https://data.api.drift.trade";
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingConfig {
    #[serde(default = "default_hyperliquid_url")]
    pub hyperliquid_url: String,

    #[serde(default = "default_drift_url")]
    pub drift_url: String,

    /// Coins whose funding history is requested concurrently.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between chunks to stay under the venue's rate limit.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,

    /// Environment variable holding the CoinGecko demo API key.
    #[serde(default = "default_coingecko_api_key_env")]
    pub coingecko_api_key_env: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_hyperliquid_url() -> String {
    HYPERLIQUID_INFO_URL.to_string()
}

fn default_drift_url() -> String {
    DRIFT_DATA_API_URL.to_string()
}

fn default_coingecko_url() -> String {
    COINGECKO_API_URL.to_string()
}

fn default_coingecko_api_key_env() -> String {
    "COINGECKO_API_KEY".to_string()
}

fn default_chunk_size() -> usize {
    10
}

fn default_chunk_delay_ms() -> u64 {
    2_000
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            hyperliquid_url: default_hyperliquid_url(),
            drift_url: default_drift_url(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            coingecko_url: default_coingecko_url(),
            coingecko_api_key_env: default_coingecko_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl FundingConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
