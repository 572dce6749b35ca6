//! Application configuration.

use crate::error::{AppError, AppResult};
use oryxen_funding::FundingConfig;
use oryxen_pacifica::PacificaConfig;
use oryxen_signing::KeySource;
use oryxen_ws::PriceClientConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Price stream configuration (`[ws]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsConfig {
    #[serde(default = "default_ws_url")]
    pub url: String,

    /// Delay before reconnecting after an unexpected close (ms).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Symbols streamed when `--symbols` is not given.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Interval for folding client counters into metrics (ms).
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

fn default_ws_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_symbols() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string(), "SOL".to_string()]
}

fn default_stats_interval_ms() -> u64 {
    1_000
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            symbols: default_symbols(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl WsConfig {
    pub fn client_config(&self) -> PriceClientConfig {
        PriceClientConfig {
            url: self.url.clone(),
            reconnect_delay_ms: self.reconnect_delay_ms,
            ..Default::default()
        }
    }
}

/// Where signing keys come from (`[keys]` section).
///
/// A `*_key_file` takes precedence over the matching `*_key_env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Master account public key (base58). Required for orders.
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,

    #[serde(default)]
    pub master_key_file: Option<PathBuf>,

    #[serde(default = "default_agent_key_env")]
    pub agent_key_env: String,

    #[serde(default)]
    pub agent_key_file: Option<PathBuf>,

    /// Expected agent public key; loading fails if the secret does not match.
    #[serde(default)]
    pub agent_public_key: Option<String>,
}

fn default_master_key_env() -> String {
    "ORYXEN_MASTER_KEY".to_string()
}

fn default_agent_key_env() -> String {
    "ORYXEN_AGENT_KEY".to_string()
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            account: None,
            master_key_env: default_master_key_env(),
            master_key_file: None,
            agent_key_env: default_agent_key_env(),
            agent_key_file: None,
            agent_public_key: None,
        }
    }
}

impl KeysConfig {
    pub fn master_source(&self) -> KeySource {
        source(&self.master_key_file, &self.master_key_env)
    }

    pub fn agent_source(&self) -> KeySource {
        source(&self.agent_key_file, &self.agent_key_env)
    }

    /// Master account address, or a configuration error when unset.
    pub fn require_account(&self) -> AppResult<&str> {
        self.account
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::Config("keys.account is not set".to_string()))
    }
}

fn source(file: &Option<PathBuf>, env: &str) -> KeySource {
    match file {
        Some(path) => KeySource::File { path: path.clone() },
        None => KeySource::EnvVar {
            var_name: env.to_string(),
        },
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ws: WsConfig,

    #[serde(default)]
    pub pacifica: PacificaConfig,

    #[serde(default)]
    pub funding: FundingConfig,

    #[serde(default)]
    pub keys: KeysConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oryxen_pacifica::Network;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ws.reconnect_delay_ms, 5_000);
        assert_eq!(config.ws.symbols, vec!["BTC", "ETH", "SOL"]);
        assert_eq!(config.pacifica.network, Network::Testnet);
        assert_eq!(config.funding.chunk_size, 10);
    }

    #[test]
    fn test_shipped_default_config_parses() {
        let config = AppConfig::from_toml(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [ws]
            url = "wss://prices.example.com"
            symbols = ["SOL"]

            [pacifica]
            network = "mainnet"
            default_slippage_percent = "1.0"

            [keys]
            account = "Master111"
            agent_key_file = "/etc/oryxen/agent.key"
            "#,
        )
        .unwrap();

        assert_eq!(config.ws.url, "wss://prices.example.com");
        assert_eq!(config.ws.reconnect_delay_ms, 5_000);
        assert_eq!(config.ws.symbols, vec!["SOL"]);
        assert_eq!(config.pacifica.network, Network::Mainnet);
        assert_eq!(config.pacifica.default_slippage_percent, dec!(1.0));
        assert_eq!(config.keys.require_account().unwrap(), "Master111");
        assert!(matches!(
            config.keys.agent_source(),
            KeySource::File { ref path } if path == &PathBuf::from("/etc/oryxen/agent.key")
        ));
        assert!(matches!(
            config.keys.master_source(),
            KeySource::EnvVar { ref var_name } if var_name == "ORYXEN_MASTER_KEY"
        ));
    }

    #[test]
    fn test_missing_account_is_config_error() {
        let keys = KeysConfig {
            account: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(keys.require_account(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            AppConfig::from_toml("[ws\nurl = 1"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_client_config_carries_delay() {
        let ws = WsConfig {
            reconnect_delay_ms: 250,
            ..Default::default()
        };
        let client = ws.client_config();
        assert_eq!(client.reconnect_delay_ms, 250);
        assert_eq!(client.url, "ws://localhost:8080");
    }
}
