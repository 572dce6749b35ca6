//! Order-related types and identifiers.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order side as the perp venues spell it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy / long.
    Bid,
    /// Sell / short.
    Ask,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }

    /// Returns 1 for bid, -1 for ask (for position calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Bid => 1,
            Self::Ask => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = CoreError;

    /// Accepts venue spelling (`bid`/`ask`) as well as `buy`/`sell` and `long`/`short`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" | "buy" | "long" => Ok(Self::Bid),
            "ask" | "sell" | "short" => Ok(Self::Ask),
            other => Err(CoreError::InvalidSide(other.to_string())),
        }
    }
}

/// Client order ID for idempotency.
///
/// Every order carries a fresh UUID v4 so that a retried submission is
/// recognised by the venue as the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Bid.opposite(), OrderSide::Ask);
        assert_eq!(OrderSide::Ask.opposite(), OrderSide::Bid);
    }

    #[test]
    fn test_order_side_sign() {
        assert_eq!(OrderSide::Bid.sign(), 1);
        assert_eq!(OrderSide::Ask.sign(), -1);
    }

    #[test]
    fn test_order_side_wire_format() {
        assert_eq!(serde_json::to_string(&OrderSide::Bid).unwrap(), r#""bid""#);
        assert_eq!(serde_json::to_string(&OrderSide::Ask).unwrap(), r#""ask""#);
    }

    #[test]
    fn test_order_side_parse_aliases() {
        assert_eq!("buy".parse::<OrderSide>().unwrap(), OrderSide::Bid);
        assert_eq!("Short".parse::<OrderSide>().unwrap(), OrderSide::Ask);
        assert!("hold".parse::<OrderSide>().is_err());
    }

    #[test]
    fn test_client_order_id_unique() {
        let id1 = ClientOrderId::new();
        let id2 = ClientOrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_client_order_id_is_uuid() {
        let id = ClientOrderId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
