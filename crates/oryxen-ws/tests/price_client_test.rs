//! Price client lifecycle integration tests.
//!
//! Tests the connection lifecycle against a local server:
//! - Subscription on open and price delivery
//! - Unsubscribe-then-subscribe ordering on symbol changes
//! - Reconnect with resubscription after a server-side close
//! - Manual disconnect without reconnect, including during the backoff
//! - Retry after a refused connection

mod integration;
use integration::common::mock_ws::MockWsServer;

use oryxen_ws::{ConnectionState, PriceClient, PriceClientConfig};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);

fn client_for(server: &MockWsServer) -> PriceClient {
    PriceClient::spawn(PriceClientConfig {
        url: server.url(),
        reconnect_delay_ms: 100,
        ..Default::default()
    })
}

fn symbols(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_mock_server_starts() {
    let server = MockWsServer::start().await;
    assert!(server.url().starts_with("ws://127.0.0.1:"));
    server.shutdown().await;
}

async fn wait_open(client: &PriceClient) {
    timeout(WAIT, client.wait_for_state(ConnectionState::Open))
        .await
        .expect("client should open within timeout")
        .unwrap();
}

#[tokio::test]
async fn test_subscribes_on_open_and_delivers_prices() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);
    let mut updates = client.subscribe_updates();

    client.connect(symbols(&["BTC", "ETH"])).await.unwrap();
    wait_open(&client).await;
    assert!(client.is_connected());

    assert!(server.wait_for_messages(1, WAIT).await);
    assert_eq!(
        server.received_json().await[0],
        json!({"type": "subscribe", "symbols": ["BTC", "ETH"]})
    );

    server.push_price("BTC", 64_000.5, 1_700_000_000_000).await;
    let update = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
    assert_eq!(update.symbol, "BTC");
    assert_eq!(update.price, 64_000.5);

    assert_eq!(client.latest_price("BTC").unwrap().price, 64_000.5);
    assert!(client.latest_price("ETH").is_none());

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_symbol_change_unsubscribes_before_subscribing() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);

    client.connect(symbols(&["BTC", "ETH"])).await.unwrap();
    wait_open(&client).await;
    assert!(server.wait_for_messages(1, WAIT).await);

    client.connect(symbols(&["ETH", "SOL"])).await.unwrap();
    assert!(server.wait_for_messages(3, WAIT).await);

    // Nothing beyond the diff is sent.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let received = server.received_json().await;
    assert_eq!(received.len(), 3);
    assert_eq!(received[1], json!({"type": "unsubscribe", "symbols": ["BTC"]}));
    assert_eq!(received[2], json!({"type": "subscribe", "symbols": ["SOL"]}));
    assert_eq!(server.connection_count().await, 1);
    assert_eq!(client.subscribed_symbols(), symbols(&["ETH", "SOL"]));

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_and_resubscribes_after_server_close() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);
    let mut state = client.subscribe_state();

    client.connect(symbols(&["SOL"])).await.unwrap();
    wait_open(&client).await;
    assert!(server.wait_for_messages(1, WAIT).await);

    server.drop_clients().await;
    timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();

    assert!(server.wait_for_connections(2, WAIT).await);
    wait_open(&client).await;
    assert!(server.wait_for_messages(2, WAIT).await);

    let received = server.received_json().await;
    assert_eq!(received[1], json!({"type": "subscribe", "symbols": ["SOL"]}));
    assert_eq!(client.stats().reconnects, 1);

    server.push_price("SOL", 150.0, 2).await;
    timeout(WAIT, async {
        while client.latest_price("SOL").is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_manual_disconnect_does_not_reconnect() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);

    client.connect(symbols(&["BTC"])).await.unwrap();
    wait_open(&client).await;

    client.disconnect().await.unwrap();
    timeout(WAIT, client.wait_for_state(ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();

    // Several reconnect delays pass without a new connection.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.connection_count().await, 1);
    assert!(!client.is_connected());
    assert_eq!(client.subscribed_symbols(), symbols(&["BTC"]));

    client.resume().await.unwrap();
    wait_open(&client).await;
    assert!(server.wait_for_connections(2, WAIT).await);

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_during_backoff_cancels_reconnect() {
    let server = MockWsServer::start().await;
    let client = PriceClient::spawn(PriceClientConfig {
        url: server.url(),
        reconnect_delay_ms: 300,
        ..Default::default()
    });
    let mut state = client.subscribe_state();

    client.connect(symbols(&["BTC"])).await.unwrap();
    wait_open(&client).await;

    server.drop_clients().await;
    timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();

    // The reconnect timer is pending; a manual disconnect cancels it.
    client.disconnect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(server.connection_count().await, 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.stats().reconnects, 0);

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_refused_connection_keeps_retrying() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PriceClient::spawn(PriceClientConfig {
        url: format!("ws://{addr}"),
        reconnect_delay_ms: 50,
        ..Default::default()
    });
    client.connect(symbols(&["BTC"])).await.unwrap();

    timeout(WAIT, async {
        while client.stats().reconnects < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("failed connects should schedule reconnects");

    assert!(!client.is_connected());
    assert_eq!(client.subscribed_symbols(), symbols(&["BTC"]));

    client.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);

    client.connect(symbols(&["BTC"])).await.unwrap();
    wait_open(&client).await;
    assert!(server.wait_for_messages(1, WAIT).await);

    server.push_text("{not json".to_string()).await;
    server.push_price("BTC", 1.0, 1).await;
    timeout(WAIT, async {
        while client.latest_price("BTC").is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert!(client.is_connected());
    assert_eq!(client.stats().malformed_frames, 1);
    assert_eq!(client.stats().price_updates, 1);

    client.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_requests_after_shutdown_fail() {
    let server = MockWsServer::start().await;
    let client = client_for(&server);
    client.shutdown().await;

    assert!(client.connect(symbols(&["BTC"])).await.is_err());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    server.shutdown().await;
}
