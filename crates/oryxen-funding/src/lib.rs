//! Funding-rate aggregation for Oryxen.
//!
//! Each venue client fetches raw funding data and normalizes it into
//! [`MarketFundingData`](oryxen_core::MarketFundingData) with venue
//! projections. [`FundingAggregator`] merges the venues.
//! [`PerpsListClient`] lists the perp markets those venues offer.

pub mod aggregator;
pub mod config;
pub mod drift;
pub mod error;
pub mod hyperliquid;
pub mod perps_list;

pub use aggregator::{merge_results, FundingAggregator, SUPPORTED_PROTOCOLS};
pub use config::{FundingConfig, COINGECKO_API_URL, DRIFT_DATA_API_URL, HYPERLIQUID_INFO_URL};
pub use drift::{transform_contract, DriftContract, DriftFundingClient};
pub use error::{FundingError, FundingResult};
pub use hyperliquid::{transform_market, HyperliquidFunding, HyperliquidFundingClient};
pub use perps_list::{build_listings, PerpListing, PerpsListClient, PERP_MARKETS};
