//! Integration tests for oryxen-ws.
//!
//! These tests run the price client against a local WebSocket server:
//! - Subscription on connect and price delivery
//! - Subscription diffing
//! - Reconnect after server-side close
//! - Manual disconnect

pub mod common;
