//! Latest-price cache.

use oryxen_core::PriceUpdate;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Latest price per symbol, shared between the stream task and readers.
#[derive(Debug, Default)]
pub struct PriceCache {
    prices: RwLock<HashMap<String, PriceUpdate>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `update` as the latest price for its symbol, returning the
    /// previous entry.
    pub fn update(&self, update: PriceUpdate) -> Option<PriceUpdate> {
        self.prices.write().insert(update.symbol.clone(), update)
    }

    pub fn latest(&self, symbol: &str) -> Option<PriceUpdate> {
        self.prices.read().get(symbol).cloned()
    }

    /// Cached updates for `symbols`, skipping those never seen.
    pub fn snapshot(&self, symbols: &[String]) -> Vec<PriceUpdate> {
        let prices = self.prices.read();
        symbols
            .iter()
            .filter_map(|s| prices.get(s).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.read().is_empty()
    }

    pub fn clear(&self) {
        self.prices.write().clear();
    }

    /// Order-independent key for a symbol set: sorted and comma-joined.
    pub fn cache_key(symbols: &[String]) -> String {
        let mut sorted: Vec<&str> = symbols.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_latest() {
        let cache = PriceCache::new();
        assert!(cache.latest("BTC").is_none());

        assert!(cache.update(PriceUpdate::new("BTC", 100.0, 1)).is_none());
        let previous = cache.update(PriceUpdate::new("BTC", 101.0, 2)).unwrap();
        assert_eq!(previous.price, 100.0);
        assert_eq!(cache.latest("BTC").unwrap().price, 101.0);
    }

    #[test]
    fn test_snapshot_skips_unknown() {
        let cache = PriceCache::new();
        cache.update(PriceUpdate::new("BTC", 1.0, 1));
        cache.update(PriceUpdate::new("SOL", 2.0, 1));

        let snap = cache.snapshot(&["SOL".to_string(), "ETH".to_string()]);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].symbol, "SOL");
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = PriceCache::cache_key(&["ETH".to_string(), "BTC".to_string()]);
        let b = PriceCache::cache_key(&["BTC".to_string(), "ETH".to_string(), "BTC".to_string()]);
        assert_eq!(a, "BTC,ETH");
        assert_eq!(a, b);
        assert_eq!(PriceCache::cache_key(&[]), "");
    }
}
