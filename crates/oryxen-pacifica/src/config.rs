//! Client configuration.

use crate::error::PacificaError;
use oryxen_signing::DEFAULT_EXPIRY_WINDOW_MS;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const TESTNET_API_URL: &str = "https://test-api.pacifica.fi/api/v1";
pub const MAINNET_API_URL: &str = "https://api.pacifica.fi/api/v1";

/// Symbols tradable through this client.
pub const SUPPORTED_SYMBOLS: [&str; 3] = ["BTC", "ETH", "SOL"];

/// Pacifica deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn api_url(&self) -> &'static str {
        match self {
            Self::Testnet => TESTNET_API_URL,
            Self::Mainnet => MAINNET_API_URL,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => write!(f, "testnet"),
            Self::Mainnet => write!(f, "mainnet"),
        }
    }
}

impl FromStr for Network {
    type Err = PacificaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            _ => Err(PacificaError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Pacifica client configuration (`[pacifica]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacificaConfig {
    #[serde(default)]
    pub network: Network,

    /// Overrides the network's base URL when set.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Validity window stamped into each signed request.
    #[serde(default = "default_expiry_window_ms")]
    pub expiry_window_ms: u64,

    /// Slippage tolerance used when an order does not specify one.
    #[serde(default = "default_slippage_percent")]
    pub default_slippage_percent: Decimal,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_expiry_window_ms() -> u64 {
    DEFAULT_EXPIRY_WINDOW_MS
}

pub(crate) fn default_slippage_percent() -> Decimal {
    Decimal::new(5, 1)
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for PacificaConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            api_url: None,
            expiry_window_ms: default_expiry_window_ms(),
            default_slippage_percent: default_slippage_percent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PacificaConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.network.api_url())
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
