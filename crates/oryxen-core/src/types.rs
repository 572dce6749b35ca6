//! Common data types for market data.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latest streamed price for a symbol.
///
/// `timestamp` is milliseconds since the Unix epoch as reported by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    pub timestamp: i64,
}

impl PriceUpdate {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    /// Age of this update relative to `now_ms`, clamped at zero.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.timestamp).max(0)
    }
}

/// Perp venues the aggregator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Drift,
    Hyperliquid,
    Jupiter,
    Flash,
    Pacifica,
}

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Self::Drift,
        Self::Hyperliquid,
        Self::Jupiter,
        Self::Flash,
        Self::Pacifica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Hyperliquid => "hyperliquid",
            Self::Jupiter => "jupiter",
            Self::Flash => "flash",
            Self::Pacifica => "pacifica",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or(CoreError::UnknownProtocol(lower))
    }
}
