//! Signature header and signing-input construction.

use crate::canonical::to_canonical_string;
use crate::error::{SigningError, SigningResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation tag for binding an agent wallet to a master account.
pub const BIND_AGENT_WALLET: &str = "bind_agent_wallet";
/// Operation tag for a market order.
pub const CREATE_MARKET_ORDER: &str = "create_market_order";

/// Default validity window of a signed request.
pub const DEFAULT_EXPIRY_WINDOW_MS: u64 = 5_000;

/// Header fields every signed request carries.
///
/// Constructed fresh per request; the timestamp is part of the signed bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Validity window in milliseconds.
    pub expiry_window: u64,
    /// Operation tag, e.g. `create_market_order`.
    #[serde(rename = "type")]
    pub operation: String,
}

impl SignatureHeader {
    /// Header stamped with the current wall-clock time.
    pub fn now(operation: impl Into<String>, expiry_window: u64) -> Self {
        Self::with_timestamp(operation, chrono::Utc::now().timestamp_millis(), expiry_window)
    }

    pub fn with_timestamp(operation: impl Into<String>, timestamp: i64, expiry_window: u64) -> Self {
        Self {
            timestamp,
            expiry_window,
            operation: operation.into(),
        }
    }
}

/// Build the exact string that gets signed.
///
/// The header fields and `data: payload` are merged into one object, keys
/// are sorted recursively and the result is written without whitespace:
///
/// ```text
/// {"data":{...},"expiry_window":5000,"timestamp":1700000000000,"type":"bind_agent_wallet"}
/// ```
///
/// # Errors
/// `SigningError::Serialization` if the payload does not serialize to a JSON
/// object.
pub fn prepare_message<P>(header: &SignatureHeader, payload: &P) -> SigningResult<String>
where
    P: Serialize + ?Sized,
{
    let data = serde_json::to_value(payload)
        .map_err(|e| SigningError::Serialization(e.to_string()))?;
    if !data.is_object() {
        return Err(SigningError::Serialization(format!(
            "payload must be a JSON object, got {}",
            json_kind(&data)
        )));
    }

    let mut message = match serde_json::to_value(header) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(SigningError::Serialization(format!(
                "header serialized to {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Err(SigningError::Serialization(e.to_string())),
    };
    message.insert("data".to_string(), data);

    Ok(to_canonical_string(Value::Object(message)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    fn bind_header() -> SignatureHeader {
        SignatureHeader::with_timestamp(BIND_AGENT_WALLET, 1_700_000_000_000, 5_000)
    }

    #[test]
    fn test_bind_agent_reference_message() {
        let payload = json!({"agent_wallet": "AgentPubkeyXYZ"});
        let message = prepare_message(&bind_header(), &payload).unwrap();
        assert_eq!(
            message,
            r#"{"data":{"agent_wallet":"AgentPubkeyXYZ"},"expiry_window":5000,"timestamp":1700000000000,"type":"bind_agent_wallet"}"#
        );
    }

    #[test]
    fn test_payload_key_order_is_irrelevant() {
        let header = SignatureHeader::with_timestamp(CREATE_MARKET_ORDER, 1, 5_000);

        let mut a = HashMap::new();
        a.insert("symbol", json!("BTC"));
        a.insert("amount", json!("0.1"));
        a.insert("side", json!("bid"));

        let b = json!({"side": "bid", "amount": "0.1", "symbol": "BTC"});

        let first = prepare_message(&header, &a).unwrap();
        for _ in 0..3 {
            assert_eq!(prepare_message(&header, &b).unwrap(), first);
        }
    }

    #[test]
    fn test_sorted_payload_keys() {
        let header = bind_header();
        let message = prepare_message(&header, &json!({"b": 1, "a": 2})).unwrap();
        let a = message.find(r#""a""#).unwrap();
        let b = message.find(r#""b""#).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_struct_payload_sorted() {
        #[derive(Serialize)]
        struct Order {
            symbol: &'static str,
            reduce_only: bool,
            amount: &'static str,
        }

        let message = prepare_message(
            &SignatureHeader::with_timestamp(CREATE_MARKET_ORDER, 10, 5_000),
            &Order {
                symbol: "SOL",
                reduce_only: false,
                amount: "2",
            },
        )
        .unwrap();
        assert_eq!(
            message,
            r#"{"data":{"amount":"2","reduce_only":false,"symbol":"SOL"},"expiry_window":5000,"timestamp":10,"type":"create_market_order"}"#
        );
    }

    #[test]
    fn test_payload_field_named_like_header_stays_under_data() {
        let message = prepare_message(&bind_header(), &json!({"type": "inner"})).unwrap();
        assert!(message.starts_with(r#"{"data":{"type":"inner"}"#));
        assert!(message.ends_with(r#""type":"bind_agent_wallet"}"#));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = prepare_message(&bind_header(), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, SigningError::Serialization(_)));
    }

    #[test]
    fn test_unserializable_payload_rejected() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("not representable"))
            }
        }

        let err = prepare_message(&bind_header(), &Broken).unwrap_err();
        assert!(matches!(err, SigningError::Serialization(_)));
    }

    #[test]
    fn test_non_string_map_keys_rejected() {
        let mut payload = BTreeMap::new();
        payload.insert((1u8, 2u8), "pair");
        let err = prepare_message(&bind_header(), &payload).unwrap_err();
        assert!(matches!(err, SigningError::Serialization(_)));
    }

    #[test]
    fn test_header_now_uses_current_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let header = SignatureHeader::now(CREATE_MARKET_ORDER, DEFAULT_EXPIRY_WINDOW_MS);
        assert!(header.timestamp >= before);
        assert_eq!(header.expiry_window, 5_000);
    }
}
