//! Cross-venue funding aggregation.

use crate::config::FundingConfig;
use crate::drift::DriftFundingClient;
use crate::error::{FundingError, FundingResult};
use crate::hyperliquid::HyperliquidFundingClient;
use oryxen_core::{MarketFundingData, Protocol};
use tracing::{info, warn};

/// Venues with a funding source.
pub const SUPPORTED_PROTOCOLS: [Protocol; 2] = [Protocol::Hyperliquid, Protocol::Drift];

/// Fetches and merges funding snapshots from every supported venue.
pub struct FundingAggregator {
    hyperliquid: HyperliquidFundingClient,
    drift: DriftFundingClient,
}

impl FundingAggregator {
    pub fn new(config: &FundingConfig) -> FundingResult<Self> {
        Ok(Self {
            hyperliquid: HyperliquidFundingClient::new(config)?,
            drift: DriftFundingClient::new(config)?,
        })
    }

    /// Funding snapshots for one venue.
    pub async fn fetch(&self, protocol: Protocol) -> FundingResult<Vec<MarketFundingData>> {
        match protocol {
            Protocol::Hyperliquid => self.hyperliquid.fetch_all().await,
            Protocol::Drift => self.drift.fetch_all().await,
            other => Err(FundingError::UnsupportedProtocol(other)),
        }
    }

    /// Funding snapshots from all venues, fetched concurrently.
    ///
    /// A failing venue contributes nothing and is logged; it never fails the
    /// whole call.
    pub async fn fetch_all(&self) -> Vec<MarketFundingData> {
        let (hyperliquid, drift) = tokio::join!(
            self.fetch(Protocol::Hyperliquid),
            self.fetch(Protocol::Drift)
        );

        let merged = merge_results([
            (Protocol::Hyperliquid, hyperliquid),
            (Protocol::Drift, drift),
        ]);
        info!(count = merged.len(), "Aggregated funding rates");
        merged
    }
}

/// Concatenate per-venue results, dropping failed venues.
pub fn merge_results<I>(results: I) -> Vec<MarketFundingData>
where
    I: IntoIterator<Item = (Protocol, FundingResult<Vec<MarketFundingData>>)>,
{
    let mut merged = Vec::new();
    for (protocol, result) in results {
        match result {
            Ok(markets) => merged.extend(markets),
            Err(e) => warn!(%protocol, error = %e, "Funding source failed"),
        }
    }
    merged
}
