//! WebSocket message types.

use crate::error::{WsError, WsResult};
use oryxen_core::PriceUpdate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Control messages (client -> server)
// ============================================================================

/// Subscription control frame.
///
/// Wire format: `{"type":"subscribe","symbols":["BTC","ETH"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Subscribe { symbols: Vec<String> },
    Unsubscribe { symbols: Vec<String> },
}

impl ControlMessage {
    pub fn subscribe(symbols: Vec<String>) -> Self {
        Self::Subscribe { symbols }
    }

    pub fn unsubscribe(symbols: Vec<String>) -> Self {
        Self::Unsubscribe { symbols }
    }

    pub fn symbols(&self) -> &[String] {
        match self {
            Self::Subscribe { symbols } | Self::Unsubscribe { symbols } => symbols,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_text(&self) -> WsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Data messages (server -> client)
// ============================================================================

/// Inbound frame from the price server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting sent once the server accepts the connection.
    Connected {
        #[serde(default)]
        message: String,
    },
    /// Acknowledgement of a subscribe request.
    SubscriptionConfirmed {
        #[serde(default)]
        symbols: Vec<String>,
    },
    /// New price for one symbol.
    PriceUpdate { data: PriceUpdate },
    /// Any other `type`; ignored.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    /// `WsError::ParseError` for malformed JSON or a missing/invalid payload.
    pub fn parse(text: &str) -> WsResult<Self> {
        serde_json::from_str(text).map_err(|e| WsError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_wire_format() {
        let msg = ControlMessage::subscribe(vec!["BTC".into(), "ETH".into()]);
        assert_eq!(
            msg.to_text().unwrap(),
            r#"{"type":"subscribe","symbols":["BTC","ETH"]}"#
        );
    }

    #[test]
    fn test_unsubscribe_wire_format() {
        let msg = ControlMessage::unsubscribe(vec!["SOL".into()]);
        assert_eq!(
            msg.to_text().unwrap(),
            r#"{"type":"unsubscribe","symbols":["SOL"]}"#
        );
    }

    #[test]
    fn test_parse_price_update() {
        let text = r#"{"type":"price_update","data":{"symbol":"BTC","price":64000.25,"timestamp":1700000000123}}"#;
        match ServerMessage::parse(text).unwrap() {
            ServerMessage::PriceUpdate { data } => {
                assert_eq!(data.symbol, "BTC");
                assert_eq!(data.price, 64000.25);
                assert_eq!(data.timestamp, 1_700_000_000_123);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_parse_informational_messages() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"connected","message":"welcome"}"#).unwrap(),
            ServerMessage::Connected {
                message: "welcome".into()
            }
        );
        assert_eq!(
            ServerMessage::parse(r#"{"type":"subscription_confirmed","symbols":["ETH"]}"#).unwrap(),
            ServerMessage::SubscriptionConfirmed {
                symbols: vec!["ETH".into()]
            }
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"heartbeat","seq":4}"#).unwrap(),
            ServerMessage::Unknown
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            ServerMessage::parse("not json"),
            Err(WsError::ParseError(_))
        ));
        assert!(matches!(
            ServerMessage::parse(r#"{"type":"price_update","data":{"symbol":"BTC"}}"#),
            Err(WsError::ParseError(_))
        ));
    }
}
