//! Normalized funding-rate data and timeframe projections.
//!
//! Every venue reports an hourly funding rate; the dashboard compares venues
//! on longer horizons, so each market carries a projection table.

use crate::types::Protocol;
use serde::{Deserialize, Serialize};

const HOURS_PER_YEAR: f64 = 24.0 * 365.25;

/// Funding rate projected onto common timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingRateProjections {
    pub current: f64,
    pub h4: f64,
    pub h8: f64,
    pub h12: f64,
    pub d1: f64,
    pub d7: f64,
    pub d30: f64,
    /// Annualized rate. Unit depends on the constructor, see below.
    pub apr: f64,
}

impl FundingRateProjections {
    /// Format every horizon as a percentage string with 6 decimals.
    ///
    /// Expects fractional rates (as produced by [`calculate_all_timeframes`]).
    pub fn to_percent_strings(&self) -> [(&'static str, String); 8] {
        let pct = |v: f64| format!("{:.6}%", v * 100.0);
        [
            ("current", pct(self.current)),
            ("h4", pct(self.h4)),
            ("h8", pct(self.h8)),
            ("h12", pct(self.h12)),
            ("d1", pct(self.d1)),
            ("d7", pct(self.d7)),
            ("d30", pct(self.d30)),
            ("apr", pct(self.apr)),
        ]
    }
}

/// Projections with APR as a fraction (`hourly * 24 * 365.25`).
pub fn calculate_all_timeframes(hourly: f64) -> FundingRateProjections {
    FundingRateProjections {
        current: hourly,
        h4: hourly * 4.0,
        h8: hourly * 8.0,
        h12: hourly * 12.0,
        d1: hourly * 24.0,
        d7: hourly * 168.0,
        d30: hourly * 720.0,
        apr: hourly * HOURS_PER_YEAR,
    }
}

/// Projections used for venue listings: day-based horizons and APR already
/// expressed in percent (`hourly * 24 * 365 * 100`).
pub fn calculate_venue_projections(hourly: f64) -> FundingRateProjections {
    let daily = hourly * 24.0;
    FundingRateProjections {
        current: hourly,
        h4: hourly * 4.0,
        h8: hourly * 8.0,
        h12: hourly * 12.0,
        d1: daily,
        d7: daily * 7.0,
        d30: daily * 30.0,
        apr: daily * 365.0 * 100.0,
    }
}

/// One market's funding snapshot, normalized across venues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFundingData {
    pub protocol: Protocol,
    pub symbol: String,
    pub price: f64,
    pub image_url: Option<String>,
    /// Hourly funding rate.
    pub funding_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_leverage: Option<u32>,
    pub projections: FundingRateProjections,
    /// Source timestamp in milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl MarketFundingData {
    /// Base asset of the market symbol (`"BTC-PERP"` -> `"BTC"`).
    pub fn base_asset(&self) -> &str {
        self.symbol.split('-').next().unwrap_or(&self.symbol)
    }
}
