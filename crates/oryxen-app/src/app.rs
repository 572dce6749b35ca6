//! Application orchestration.
//!
//! Each CLI subcommand maps to one method on [`Application`]. Metrics are
//! fed from the price client's public surface (update broadcast, state
//! watch and counters) so the stream crate stays free of telemetry.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use oryxen_core::{MarketFundingData, OrderSide, Protocol, WalletTransaction};
use oryxen_funding::{FundingAggregator, PerpListing, PerpsListClient, SUPPORTED_PROTOCOLS};
use oryxen_pacifica::{MarketOrderParams, OrderResponse, PacificaClient};
use oryxen_signing::AgentKeypair;
use oryxen_telemetry::Metrics;
use oryxen_ws::{ClientStats, PriceClient};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Arguments of a market order from the command line.
#[derive(Debug, Clone)]
pub struct OrderArgs {
    pub symbol: String,
    pub amount: Decimal,
    pub side: OrderSide,
    pub slippage_percent: Option<Decimal>,
    pub reduce_only: bool,
}

impl OrderArgs {
    pub fn to_params(&self) -> MarketOrderParams {
        let mut params = MarketOrderParams::new(self.symbol.to_uppercase(), self.amount, self.side)
            .reduce_only(self.reduce_only);
        if let Some(slippage) = self.slippage_percent {
            params = params.with_slippage(slippage);
        }
        params
    }
}

/// Turns cumulative client counters into per-interval deltas.
#[derive(Debug, Default)]
pub struct StatsTracker {
    last: ClientStats,
}

impl StatsTracker {
    /// Returns `(reconnects, malformed_frames)` since the previous call.
    pub fn observe(&mut self, stats: ClientStats) -> (u64, u64) {
        let reconnects = stats.reconnects.saturating_sub(self.last.reconnects);
        let malformed = stats
            .malformed_frames
            .saturating_sub(self.last.malformed_frames);
        self.last = stats;
        (reconnects, malformed)
    }
}

/// Uppercase, trim and de-duplicate symbols, keeping first-seen order.
pub fn normalize_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = Vec::new();
    for symbol in symbols {
        let symbol = symbol.as_ref().trim().to_uppercase();
        if !symbol.is_empty() && !seen.contains(&symbol) {
            seen.push(symbol);
        }
    }
    seen
}

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stream prices until Ctrl-C.
    ///
    /// Falls back to the configured symbols when `symbols` is empty.
    pub async fn run_stream(&self, symbols: Vec<String>) -> AppResult<()> {
        let symbols = if symbols.is_empty() {
            normalize_symbols(&self.config.ws.symbols)
        } else {
            normalize_symbols(symbols)
        };

        let client = PriceClient::spawn(self.config.ws.client_config());
        let mut updates = client.subscribe_updates();
        let mut states = client.subscribe_state();
        let mut stats_interval =
            tokio::time::interval(Duration::from_millis(self.config.ws.stats_interval_ms.max(1)));
        let mut tracker = StatsTracker::default();

        Metrics::ws_state_set(&client.state().to_string());
        info!(url = %self.config.ws.url, ?symbols, "Starting price stream");
        client.connect(symbols).await?;

        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Ok(update) => {
                        let age_ms = update.age_ms(chrono::Utc::now().timestamp_millis());
                        Metrics::price_update(&update.symbol, age_ms);
                        info!(
                            symbol = %update.symbol,
                            price = update.price,
                            age_ms,
                            "Price update"
                        );
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Price consumer lagging, updates skipped");
                    }
                    Err(RecvError::Closed) => {
                        warn!("Price stream ended");
                        break;
                    }
                },

                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *states.borrow_and_update();
                    Metrics::ws_state_set(&state.to_string());
                    info!(%state, "Price stream state changed");
                }

                _ = stats_interval.tick() => {
                    let (reconnects, malformed) = tracker.observe(client.stats());
                    if reconnects > 0 {
                        Metrics::ws_reconnects(reconnects);
                    }
                    if malformed > 0 {
                        Metrics::ws_parse_errors(malformed);
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if let Err(e) = client.disconnect().await {
            debug!(error = %e, "Disconnect after stream end");
        }
        client.shutdown().await;
        Metrics::ws_state_set(&client.state().to_string());

        let (reconnects, malformed) = tracker.observe(client.stats());
        Metrics::ws_reconnects(reconnects);
        Metrics::ws_parse_errors(malformed);

        let stats = client.stats();
        info!(
            price_updates = stats.price_updates,
            reconnects = stats.reconnects,
            malformed_frames = stats.malformed_frames,
            "Price stream stopped"
        );
        match Metrics::gather_text() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
        Ok(())
    }

    /// Fresh agent keypair.
    pub fn keygen() -> AgentKeypair {
        let keypair = AgentKeypair::generate();
        info!(public_key = %keypair.public_key_base58(), "Generated agent keypair");
        keypair
    }

    /// Bind the configured agent key to the master account.
    pub async fn bind_agent(&self) -> AppResult<Value> {
        let keys = &self.config.keys;
        let master = keys.master_source().load(keys.account.as_deref())?;
        let agent = keys
            .agent_source()
            .load(keys.agent_public_key.as_deref())?;

        let client = PacificaClient::new(self.config.pacifica.clone())?;
        Ok(client.bind_agent_wallet(&master, &agent).await?)
    }

    /// Submit a market order signed by the agent key.
    pub async fn place_order(&self, args: &OrderArgs) -> AppResult<OrderResponse> {
        let keys = &self.config.keys;
        let account = keys.require_account()?;
        let agent = keys
            .agent_source()
            .load(keys.agent_public_key.as_deref())?;

        let params = args.to_params();
        let client = PacificaClient::new(self.config.pacifica.clone())?;
        let result = client.create_market_order(account, &agent, &params).await;

        Metrics::order_submitted(&params.symbol, params.side.as_str(), result.is_ok());
        Ok(result?)
    }

    /// Funding snapshot for one venue, or every supported venue.
    pub async fn fetch_funding(
        &self,
        protocol: Option<Protocol>,
    ) -> AppResult<Vec<MarketFundingData>> {
        let aggregator = FundingAggregator::new(&self.config.funding)?;
        let markets = match protocol {
            Some(protocol) => aggregator.fetch(protocol).await?,
            None => aggregator.fetch_all().await,
        };

        let counts = count_by_protocol(&markets);
        let reported: Vec<Protocol> = match protocol {
            Some(protocol) => vec![protocol],
            None => SUPPORTED_PROTOCOLS.to_vec(),
        };
        for protocol in reported {
            let count = counts.get(&protocol).copied().unwrap_or(0);
            Metrics::funding_markets(protocol.as_str(), count);
            info!(%protocol, count, "Funding markets");
        }

        Ok(markets)
    }
}

impl Application {
    /// Perp markets listed on the supported venues.
    pub async fn fetch_perps(&self) -> AppResult<Vec<PerpListing>> {
        let client = PerpsListClient::new(&self.config.funding)?;
        let listings = client.fetch_all().await?;
        info!(count = listings.len(), "Perp listings");
        Ok(listings)
    }

    /// Classify a base58 wire transaction handed back by a wallet.
    pub fn inspect_transaction(encoded: &str) -> AppResult<WalletTransaction> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| AppError::Decode(e.to_string()))?;
        let tx = WalletTransaction::from_wire_bytes(bytes)?;
        info!(
            versioned = tx.is_versioned(),
            version = ?tx.version(),
            len = tx.as_bytes().len(),
            "Decoded wallet transaction"
        );
        Ok(tx)
    }
}

fn count_by_protocol(markets: &[MarketFundingData]) -> HashMap<Protocol, usize> {
    let mut counts = HashMap::new();
    for market in markets {
        *counts.entry(market.protocol).or_insert(0) += 1;
    }
    counts
}
