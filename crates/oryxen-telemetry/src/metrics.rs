//! Prometheus metrics for Oryxen.
//!
//! Covers:
//! - Price stream connection state and reconnects
//! - Price update throughput and staleness
//! - Malformed inbound frames
//! - Order submissions
//! - Funding fetches per venue
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`: a failure means duplicate metric
//! names, which must crash at startup. These panics only occur during static
//! initialization, never at runtime.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_counter, CounterVec, Encoder, Gauge, GaugeVec, HistogramVec, IntCounter,
    TextEncoder,
};

/// Price stream connection state (1 = open, 0 = otherwise).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "oryxen_ws_connected",
        "Price stream connection state (1=open)"
    )
    .unwrap()
});

/// Price stream state machine current state.
/// Labels: state (disconnected/connecting/open/closing)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "oryxen_ws_state",
        "Price stream state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Total automatic reconnects.
pub static WS_RECONNECT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "oryxen_ws_reconnect_total",
        "Total price stream reconnects"
    )
    .unwrap()
});

/// Inbound frames dropped as malformed.
pub static WS_PARSE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "oryxen_ws_parse_errors_total",
        "Total malformed price stream frames"
    )
    .unwrap()
});

/// Price updates received.
pub static PRICE_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "oryxen_price_updates_total",
        "Total price updates received",
        &["symbol"]
    )
    .unwrap()
});

/// Age of a price update when it reaches the client.
pub static PRICE_AGE_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "oryxen_price_age_ms",
        "Price update age at receipt in milliseconds",
        &["symbol"],
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Orders submitted.
/// Labels: symbol, side, outcome (accepted/rejected)
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "oryxen_orders_submitted_total",
        "Total market orders submitted",
        &["symbol", "side", "outcome"]
    )
    .unwrap()
});

/// Markets returned by the last funding fetch per venue.
pub static FUNDING_MARKETS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "oryxen_funding_markets",
        "Markets in the last funding snapshot",
        &["protocol"]
    )
    .unwrap()
});

const WS_STATES: [&str; 4] = ["disconnected", "connecting", "open", "closing"];

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record the price stream state; also drives the connected gauge.
    pub fn ws_state_set(state: &str) {
        for s in WS_STATES {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
        WS_CONNECTED.set(if state == "open" { 1.0 } else { 0.0 });
    }

    pub fn ws_reconnects(count: u64) {
        WS_RECONNECT_TOTAL.inc_by(count);
    }

    pub fn ws_parse_errors(count: u64) {
        WS_PARSE_ERRORS_TOTAL.inc_by(count);
    }

    /// Record a price update and its age.
    pub fn price_update(symbol: &str, age_ms: i64) {
        PRICE_UPDATES_TOTAL.with_label_values(&[symbol]).inc();
        PRICE_AGE_MS
            .with_label_values(&[symbol])
            .observe(age_ms.max(0) as f64);
    }

    pub fn order_submitted(symbol: &str, side: &str, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        ORDERS_SUBMITTED_TOTAL
            .with_label_values(&[symbol, side, outcome])
            .inc();
    }

    pub fn funding_markets(protocol: &str, count: usize) {
        FUNDING_MARKETS
            .with_label_values(&[protocol])
            .set(count as f64);
    }

    /// Render the default registry in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
