//! Mock price server for integration tests.
//!
//! Provides a simple WebSocket server that can:
//! - Accept connections and greet them
//! - Confirm subscriptions
//! - Record received messages
//! - Push frames to, or drop, every connected client

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Debug, Clone)]
enum Push {
    Text(String),
    Close,
}

/// A mock price server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<u32>>,
    clients: Arc<Mutex<Vec<mpsc::UnboundedSender<Push>>>>,
}

impl MockWsServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(Mutex::new(0));
        let clients = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();
        let clients_clone = clients.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let (push_tx, push_rx) = mpsc::unbounded_channel();
                        clients_clone.lock().await.push(push_tx);
                        tokio::spawn(handle_connection(
                            stream,
                            messages_clone.clone(),
                            connections_clone.clone(),
                            push_rx,
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connections,
            clients,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of completed WebSocket handshakes.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// All text frames received from clients, in arrival order.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    /// Received frames parsed as JSON.
    pub async fn received_json(&self) -> Vec<serde_json::Value> {
        self.received_messages()
            .await
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Send a price update to every connected client.
    pub async fn push_price(&self, symbol: &str, price: f64, timestamp: i64) {
        let frame = serde_json::json!({
            "type": "price_update",
            "data": { "symbol": symbol, "price": price, "timestamp": timestamp }
        });
        self.push_text(frame.to_string()).await;
    }

    /// Send a raw text frame to every connected client.
    pub async fn push_text(&self, text: String) {
        let clients = self.clients.lock().await;
        for client in clients.iter() {
            let _ = client.send(Push::Text(text.clone()));
        }
    }

    /// Close every client connection from the server side.
    pub async fn drop_clients(&self) {
        let mut clients = self.clients.lock().await;
        for client in clients.drain(..) {
            let _ = client.send(Push::Close);
        }
    }

    /// Poll until `count` handshakes have completed.
    pub async fn wait_for_connections(&self, count: u32, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            while self.connection_count().await < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Poll until at least `count` frames have been received.
    pub async fn wait_for_messages(&self, count: usize, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            while self.messages.lock().await.len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        self.drop_clients().await;
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    messages: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<u32>>,
    mut push_rx: mpsc::UnboundedReceiver<Push>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let (mut write, mut read) = ws_stream.split();

    let greeting = serde_json::json!({"type": "connected", "message": "mock price server"});
    let _ = write.send(Message::Text(greeting.to_string())).await;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        messages.lock().await.push(text.clone());

                        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&text) {
                            if parsed.get("type") == Some(&serde_json::json!("subscribe")) {
                                let response = serde_json::json!({
                                    "type": "subscription_confirmed",
                                    "symbols": parsed.get("symbols").cloned().unwrap_or_default()
                                });
                                let _ = write.send(Message::Text(response.to_string())).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            push = push_rx.recv() => {
                match push {
                    Some(Push::Text(text)) => {
                        let _ = write.send(Message::Text(text)).await;
                    }
                    Some(Push::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }
}
