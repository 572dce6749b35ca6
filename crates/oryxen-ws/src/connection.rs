//! Price client driver.
//!
//! A single tokio task owns the [`PriceStreamState`], the WebSocket and the
//! reconnect timer. Callers talk to it through a [`PriceClient`] handle:
//! requests go over an mpsc channel, prices come back through the shared
//! [`PriceCache`] and a broadcast channel.

use crate::cache::PriceCache;
use crate::error::{WsError, WsResult};
use crate::message::ControlMessage;
use crate::state::{Command, ConnectionState, PriceStreamState};
use futures_util::{SinkExt, StreamExt};
use oryxen_core::PriceUpdate;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectFuture = Pin<Box<dyn Future<Output = Result<WsStream, tungstenite::Error>> + Send>>;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct PriceClientConfig {
    /// WebSocket URL of the price server.
    pub url: String,
    /// Delay before reconnecting after an unexpected close.
    pub reconnect_delay_ms: u64,
    /// Capacity of the request channel.
    pub request_buffer: usize,
    /// Capacity of the price update broadcast channel.
    pub update_buffer: usize,
}

impl Default for PriceClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080".to_string(),
            reconnect_delay_ms: 5_000,
            request_buffer: 32,
            update_buffer: 1024,
        }
    }
}

/// Counters published by the driver task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Transports opened by the reconnect timer.
    pub reconnects: u64,
    /// Price updates delivered.
    pub price_updates: u64,
    /// Inbound frames dropped as malformed.
    pub malformed_frames: u64,
}

#[derive(Debug)]
enum Request {
    Connect(Vec<String>),
    Resume,
    Disconnect,
}

#[derive(Debug, Default)]
struct Snapshot {
    symbols: Vec<String>,
    stats: ClientStats,
}

/// Handle to a running price stream.
pub struct PriceClient {
    request_tx: mpsc::Sender<Request>,
    snapshot: Arc<RwLock<Snapshot>>,
    cache: Arc<PriceCache>,
    updates_tx: broadcast::Sender<PriceUpdate>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PriceClient {
    /// Spawn the driver task. Nothing is opened until [`connect`](Self::connect).
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: PriceClientConfig) -> Self {
        if config.url.starts_with("wss://") {
            crate::init_crypto();
        }

        let (request_tx, request_rx) = mpsc::channel(config.request_buffer.max(1));
        let (updates_tx, _) = broadcast::channel(config.update_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let snapshot = Arc::new(RwLock::new(Snapshot::default()));
        let cache = Arc::new(PriceCache::new());
        let shutdown_token = CancellationToken::new();

        let driver = Driver {
            url: config.url,
            machine: PriceStreamState::new(Duration::from_millis(config.reconnect_delay_ms)),
            connecting: None,
            stream: None,
            reconnect: None,
            requests: request_rx,
            snapshot: snapshot.clone(),
            cache: cache.clone(),
            updates_tx: updates_tx.clone(),
            state_tx,
            shutdown_token: shutdown_token.clone(),
            stats: ClientStats::default(),
        };
        let task = tokio::spawn(driver.run());

        Self {
            request_tx,
            snapshot,
            cache,
            updates_tx,
            state_rx,
            shutdown_token,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stream prices for `symbols`.
    ///
    /// Opens the connection if needed; otherwise diffs the subscription.
    pub async fn connect(&self, symbols: Vec<String>) -> WsResult<()> {
        self.request(Request::Connect(symbols)).await
    }

    /// Reconnect with the symbols retained from the last session.
    pub async fn resume(&self) -> WsResult<()> {
        self.request(Request::Resume).await
    }

    /// Close the connection and suppress automatic reconnect.
    pub async fn disconnect(&self) -> WsResult<()> {
        self.request(Request::Disconnect).await
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Symbols currently requested (retained across manual disconnect).
    pub fn subscribed_symbols(&self) -> Vec<String> {
        self.snapshot.read().symbols.clone()
    }

    pub fn stats(&self) -> ClientStats {
        self.snapshot.read().stats
    }

    pub fn latest_price(&self, symbol: &str) -> Option<PriceUpdate> {
        self.cache.latest(symbol)
    }

    pub fn cache(&self) -> Arc<PriceCache> {
        self.cache.clone()
    }

    /// Receive every price update delivered after this call.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<PriceUpdate> {
        self.updates_tx.subscribe()
    }

    /// Watch connection state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Wait until the connection reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> WsResult<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| WsError::ClientClosed)
    }

    /// Stop the driver task, closing any open connection.
    pub async fn shutdown(&self) {
        info!("PriceClient shutdown requested");
        self.shutdown_token.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(?e, "Price stream task failed");
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    async fn request(&self, request: Request) -> WsResult<()> {
        if self.is_shutdown() {
            return Err(WsError::ClientClosed);
        }
        self.request_tx
            .send(request)
            .await
            .map_err(|_| WsError::ClientClosed)
    }
}

impl Drop for PriceClient {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

enum Event {
    Shutdown,
    Request(Option<Request>),
    Opened(Result<WsStream, tungstenite::Error>),
    Frame(Option<Result<Message, tungstenite::Error>>),
    ReconnectTimer,
}

/// Task-local state; never shared, so no lock is held across an await.
struct Driver {
    url: String,
    machine: PriceStreamState,
    connecting: Option<ConnectFuture>,
    stream: Option<WsStream>,
    reconnect: Option<Pin<Box<Sleep>>>,
    requests: mpsc::Receiver<Request>,
    snapshot: Arc<RwLock<Snapshot>>,
    cache: Arc<PriceCache>,
    updates_tx: broadcast::Sender<PriceUpdate>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_token: CancellationToken,
    stats: ClientStats,
}

impl Driver {
    async fn run(mut self) {
        debug!(url = %self.url, "Price stream task started");

        loop {
            let event = tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => Event::Shutdown,
                request = self.requests.recv() => Event::Request(request),
                result = poll_connecting(&mut self.connecting) => Event::Opened(result),
                frame = next_frame(&mut self.stream) => Event::Frame(frame),
                () = wait_timer(&mut self.reconnect) => Event::ReconnectTimer,
            };

            let commands = match event {
                Event::Shutdown | Event::Request(None) => break,
                Event::Request(Some(request)) => self.handle_request(request),
                Event::Opened(result) => self.handle_opened(result),
                Event::Frame(frame) => self.handle_frame(frame).await,
                Event::ReconnectTimer => {
                    self.reconnect = None;
                    let commands = self.machine.on_reconnect_timer();
                    if commands.contains(&Command::OpenTransport) {
                        self.stats.reconnects += 1;
                    }
                    commands
                }
            };
            self.execute(commands).await;
        }

        self.reconnect = None;
        self.connecting = None;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!(?e, "Close frame not sent during shutdown");
            }
        }
        self.machine.disconnect();
        self.machine.on_close();
        self.publish();
        info!("Price stream task stopped");
    }

    fn handle_request(&mut self, request: Request) -> Vec<Command> {
        match request {
            Request::Connect(symbols) => self.machine.connect(symbols),
            Request::Resume => self.machine.resume(),
            Request::Disconnect => self.machine.disconnect(),
        }
    }

    fn handle_opened(&mut self, result: Result<WsStream, tungstenite::Error>) -> Vec<Command> {
        self.connecting = None;
        match result {
            Ok(stream) => {
                info!(url = %self.url, "WebSocket connected");
                self.stream = Some(stream);
                self.machine.on_open()
            }
            Err(e) => {
                let failed = WsError::ConnectionFailed(e.to_string());
                error!(%failed, url = %self.url, "WebSocket connection failed");
                let mut commands = self.machine.on_error(&failed.to_string());
                commands.extend(self.machine.on_close());
                commands
            }
        }
    }

    async fn handle_frame(
        &mut self,
        frame: Option<Result<Message, tungstenite::Error>>,
    ) -> Vec<Command> {
        match frame {
            Some(Ok(Message::Text(text))) => self.machine.on_message(&text),
            Some(Ok(Message::Ping(data))) => {
                debug!("Received ping, sending pong");
                if let Some(stream) = self.stream.as_mut() {
                    if let Err(e) = stream.send(Message::Pong(data)).await {
                        return self.transport_lost(&e.to_string());
                    }
                }
                Vec::new()
            }
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = frame
                    .map(|f| (f.code.into(), f.reason.to_string()))
                    .unwrap_or((1000, "Normal close".to_string()));
                let closed = WsError::ConnectionClosed { code, reason };
                warn!(%closed, "WebSocket closed by server");
                self.stream = None;
                self.machine.on_close()
            }
            Some(Ok(_)) => Vec::new(),
            Some(Err(e)) => self.transport_lost(&e.to_string()),
            None => {
                warn!("WebSocket stream ended");
                self.stream = None;
                self.machine.on_close()
            }
        }
    }

    fn transport_lost(&mut self, error: &str) -> Vec<Command> {
        self.stream = None;
        let mut commands = self.machine.on_error(error);
        commands.extend(self.machine.on_close());
        commands
    }

    async fn execute(&mut self, commands: Vec<Command>) {
        let mut queue = VecDeque::from(commands);

        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                Command::OpenTransport => {
                    self.open_transport();
                    Vec::new()
                }
                Command::Send(message) => self.send(message).await,
                Command::CloseTransport => self.close_transport().await,
                Command::ScheduleReconnect(delay) => {
                    self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                    Vec::new()
                }
                Command::CancelReconnect => {
                    self.reconnect = None;
                    Vec::new()
                }
                Command::Deliver(update) => {
                    self.deliver(update);
                    Vec::new()
                }
            };
            queue.extend(follow_up);
        }

        self.publish();
    }

    fn open_transport(&mut self) {
        info!(url = %self.url, "Connecting to WebSocket");
        let url = self.url.clone();
        self.connecting = Some(Box::pin(async move {
            connect_async_tls_with_config(url, None, true, None)
                .await
                .map(|(stream, _response)| stream)
        }));
    }

    async fn send(&mut self, message: ControlMessage) -> Vec<Command> {
        let Some(stream) = self.stream.as_mut() else {
            debug!(?message, "No open transport, dropping control message");
            return Vec::new();
        };

        let text = match message.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!(?e, "Failed to encode control message");
                return Vec::new();
            }
        };

        match stream.send(Message::Text(text)).await {
            Ok(()) => {
                debug!(?message, "Control message sent");
                Vec::new()
            }
            Err(e) => {
                let failed = WsError::SendFailed(e.to_string());
                warn!(%failed, "Dropping transport");
                self.transport_lost(&failed.to_string())
            }
        }
    }

    async fn close_transport(&mut self) -> Vec<Command> {
        self.connecting = None;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!(?e, "Close frame not sent");
            }
        }
        self.machine.on_close()
    }

    fn deliver(&mut self, update: PriceUpdate) {
        self.stats.price_updates += 1;
        self.cache.update(update.clone());
        // No receivers is fine; the cache still holds the price.
        let _ = self.updates_tx.send(update);
    }

    fn publish(&mut self) {
        self.stats.malformed_frames = self.machine.malformed_frames();
        {
            let mut snapshot = self.snapshot.write();
            snapshot.symbols = self.machine.subscribed_symbols().to_vec();
            snapshot.stats = self.stats;
        }
        let next = self.machine.state();
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}

async fn poll_connecting(
    connecting: &mut Option<ConnectFuture>,
) -> Result<WsStream, tungstenite::Error> {
    match connecting.as_mut() {
        Some(future) => future.await,
        None => pending().await,
    }
}

async fn next_frame(
    stream: &mut Option<WsStream>,
) -> Option<Result<Message, tungstenite::Error>> {
    match stream.as_mut() {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.await,
        None => pending().await,
    }
}
