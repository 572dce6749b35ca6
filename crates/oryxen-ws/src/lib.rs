//! Real-time price client for Oryxen.
//!
//! Keeps one logical subscription to a streaming price feed alive over an
//! unreliable transport:
//! - Fixed-delay reconnect after unexpected close (5s by default)
//! - Subscription diffing (`unsubscribe` then `subscribe`) on symbol changes
//! - Manual disconnect suppresses reconnect until the next `connect`
//! - Latest price per symbol kept in a shared cache
//!
//! The connection logic lives in [`PriceStreamState`], a sans-IO state
//! machine; [`PriceClient`] drives it with tokio-tungstenite.

pub mod cache;
pub mod connection;
pub mod error;
pub mod message;
pub mod state;
pub mod subscription;

pub use cache::PriceCache;
pub use connection::{ClientStats, PriceClient, PriceClientConfig};
pub use error::{WsError, WsResult};
pub use message::{ControlMessage, ServerMessage};
pub use state::{Command, ConnectionState, PriceStreamState, DEFAULT_RECONNECT_DELAY};
pub use subscription::{SubscriptionDiff, SubscriptionSet};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
