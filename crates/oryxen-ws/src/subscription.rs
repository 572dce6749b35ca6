//! Subscription set tracking and diffing.

use std::collections::HashSet;

/// Symbols subscribed on the live connection, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    symbols: Vec<String>,
}

/// Control traffic needed to move from one subscription set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDiff {
    /// Symbols in the old set but not the new one.
    pub unsubscribe: Vec<String>,
    /// Symbols in the new set but not the old one.
    pub subscribe: Vec<String>,
}

impl SubscriptionDiff {
    pub fn is_empty(&self) -> bool {
        self.unsubscribe.is_empty() && self.subscribe.is_empty()
    }
}

impl SubscriptionSet {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.replace(symbols.into_iter().map(Into::into).collect());
        set
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Compute the diff to `requested` without mutating the set.
    ///
    /// Both lists keep their relative order.
    pub fn diff(&self, requested: &[String]) -> SubscriptionDiff {
        let old: HashSet<&str> = self.symbols.iter().map(String::as_str).collect();
        let new: HashSet<&str> = requested.iter().map(String::as_str).collect();

        let unsubscribe = self
            .symbols
            .iter()
            .filter(|s| !new.contains(s.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let subscribe = requested
            .iter()
            .filter(|s| !old.contains(s.as_str()) && seen.insert(s.as_str()))
            .cloned()
            .collect();

        SubscriptionDiff {
            unsubscribe,
            subscribe,
        }
    }

    /// Replace the tracked symbols, dropping duplicates (first occurrence wins).
    pub fn replace(&mut self, symbols: Vec<String>) {
        let mut seen = HashSet::new();
        self.symbols = symbols
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
    }
}
