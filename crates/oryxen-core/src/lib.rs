//! Core domain types for Oryxen.
//!
//! This crate provides the types shared by every venue integration:
//! - `PriceUpdate`: latest streamed price for a symbol
//! - `OrderSide`, `ClientOrderId`: order placement primitives
//! - `MarketFundingData`, `FundingRateProjections`: normalized funding data
//! - `WalletTransaction`: legacy vs versioned transaction encodings

pub mod error;
pub mod funding;
pub mod order;
pub mod transaction;
pub mod types;

pub use error::{CoreError, Result};
pub use funding::{
    calculate_all_timeframes, calculate_venue_projections, FundingRateProjections,
    MarketFundingData,
};
pub use order::{ClientOrderId, OrderSide};
pub use transaction::WalletTransaction;
pub use types::{PriceUpdate, Protocol};
