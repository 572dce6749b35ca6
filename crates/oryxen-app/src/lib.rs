//! Oryxen command-line application.
//!
//! Wires the crates together behind one binary:
//! - `stream`: live prices from the reconnecting price client
//! - `keygen` / `bind-agent`: agent wallet setup on Pacifica
//! - `order`: signed market orders
//! - `funding`: cross-venue funding snapshot

pub mod app;
pub mod config;
pub mod error;

pub use app::{normalize_symbols, Application, OrderArgs, StatsTracker};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
