//! Connection/subscription state machine.
//!
//! `PriceStreamState` owns all mutable connection state and reacts to events
//! (caller requests, transport callbacks, timer expiry) by returning the
//! [`Command`]s the driver must execute. It performs no I/O, so every
//! transition can be tested deterministically.
//!
//! Invariants:
//! - At most one transport exists (open or in flight).
//! - At most one reconnect timer is pending; only a transport close
//!   schedules it.
//! - A manual `disconnect()` suppresses reconnect until the next `connect()`.
//! - Within one diff, `unsubscribe` is emitted before `subscribe`.

use crate::message::{ControlMessage, ServerMessage};
use crate::subscription::SubscriptionSet;
use oryxen_core::PriceUpdate;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed delay before reconnecting after an unexpected close.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

/// Transport lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

/// Side effect requested from the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a new transport; report `on_open` or `on_close` when it settles.
    OpenTransport,
    /// Send a control frame on the open transport.
    Send(ControlMessage),
    /// Close the current transport; report `on_close` when done.
    CloseTransport,
    /// Arm the reconnect timer; report `on_reconnect_timer` when it fires.
    ScheduleReconnect(Duration),
    /// Disarm the pending reconnect timer.
    CancelReconnect,
    /// Hand a price update to consumers.
    Deliver(PriceUpdate),
}

/// Sans-IO state machine for the price stream.
#[derive(Debug)]
pub struct PriceStreamState {
    state: ConnectionState,
    /// Symbols requested by the caller; equal to the server-side set while open.
    subscriptions: SubscriptionSet,
    manual_disconnect: bool,
    reconnect_pending: bool,
    /// `connect()` arrived while closing; open a new transport once closed.
    reopen_after_close: bool,
    reconnect_delay: Duration,
    malformed_frames: u64,
}

impl Default for PriceStreamState {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl PriceStreamState {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            subscriptions: SubscriptionSet::default(),
            manual_disconnect: false,
            reconnect_pending: false,
            reopen_after_close: false,
            reconnect_delay,
            malformed_frames: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn subscribed_symbols(&self) -> &[String] {
        self.subscriptions.symbols()
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_manual_disconnect(&self) -> bool {
        self.manual_disconnect
    }

    /// Frames dropped because they failed to parse.
    pub fn malformed_frames(&self) -> u64 {
        self.malformed_frames
    }

    /// Request prices for `symbols`.
    ///
    /// - Open: diff against the live set and emit unsubscribe/subscribe.
    /// - Connecting: only record the new set; it is sent on open.
    /// - Closing: record the set and reopen once the old transport is gone.
    /// - Disconnected: open a transport.
    ///
    /// Always clears the manual-disconnect flag.
    pub fn connect(&mut self, symbols: Vec<String>) -> Vec<Command> {
        self.manual_disconnect = false;

        match self.state {
            ConnectionState::Open => self.update_subscription(symbols),
            ConnectionState::Connecting => {
                debug!(?symbols, "Connect while connecting, queueing symbols");
                self.subscriptions.replace(symbols);
                Vec::new()
            }
            ConnectionState::Closing => {
                debug!(?symbols, "Connect while closing, reopening after close");
                self.subscriptions.replace(symbols);
                self.reopen_after_close = true;
                Vec::new()
            }
            ConnectionState::Disconnected => {
                let mut commands = Vec::with_capacity(2);
                if self.reconnect_pending {
                    self.reconnect_pending = false;
                    commands.push(Command::CancelReconnect);
                }
                self.subscriptions.replace(symbols);
                self.state = ConnectionState::Connecting;
                info!(symbols = ?self.subscriptions.symbols(), "Opening price stream");
                commands.push(Command::OpenTransport);
                commands
            }
        }
    }

    /// Reconnect with the retained symbol set.
    pub fn resume(&mut self) -> Vec<Command> {
        let symbols = self.subscriptions.symbols().to_vec();
        self.connect(symbols)
    }

    /// Stop streaming and suppress automatic reconnect.
    ///
    /// The subscribed symbols are kept so that [`resume`](Self::resume) can
    /// restore them.
    pub fn disconnect(&mut self) -> Vec<Command> {
        self.manual_disconnect = true;
        self.reopen_after_close = false;

        let mut commands = Vec::with_capacity(2);
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }

        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                info!(state = %self.state, "Manual disconnect");
                self.state = ConnectionState::Closing;
                commands.push(Command::CloseTransport);
            }
            ConnectionState::Closing | ConnectionState::Disconnected => {}
        }
        commands
    }

    /// Transport finished its handshake.
    pub fn on_open(&mut self) -> Vec<Command> {
        if self.state != ConnectionState::Connecting {
            warn!(state = %self.state, "Ignoring open event outside connecting state");
            return Vec::new();
        }

        self.state = ConnectionState::Open;
        info!("Price stream connected");

        if self.subscriptions.is_empty() {
            return Vec::new();
        }
        let symbols = self.subscriptions.symbols().to_vec();
        debug!(?symbols, "Subscribing");
        vec![Command::Send(ControlMessage::subscribe(symbols))]
    }

    /// Inbound text frame.
    ///
    /// Malformed frames are logged and dropped; the connection stays up.
    pub fn on_message(&mut self, text: &str) -> Vec<Command> {
        match ServerMessage::parse(text) {
            Ok(ServerMessage::PriceUpdate { data }) => vec![Command::Deliver(data)],
            Ok(ServerMessage::Connected { message }) => {
                info!(%message, "Price server greeting");
                Vec::new()
            }
            Ok(ServerMessage::SubscriptionConfirmed { symbols }) => {
                info!(?symbols, "Subscription confirmed");
                Vec::new()
            }
            Ok(ServerMessage::Unknown) => {
                debug!("Ignoring unknown message type");
                Vec::new()
            }
            Err(e) => {
                self.malformed_frames += 1;
                warn!(error = %e, "Dropping malformed frame");
                Vec::new()
            }
        }
    }

    /// Transport reported an error. A close event always follows, so this
    /// only logs.
    pub fn on_error(&mut self, error: &str) -> Vec<Command> {
        warn!(%error, state = %self.state, "Price stream transport error");
        Vec::new()
    }

    /// Transport is gone (closed by either side, or failed to open).
    ///
    /// This is the single path that schedules a reconnect.
    pub fn on_close(&mut self) -> Vec<Command> {
        let previous = self.state;
        if previous == ConnectionState::Disconnected {
            debug!("Ignoring close event while disconnected");
            return Vec::new();
        }
        self.state = ConnectionState::Disconnected;

        if self.reopen_after_close {
            self.reopen_after_close = false;
            return self.resume();
        }

        if self.manual_disconnect {
            info!("Price stream closed");
            return Vec::new();
        }

        if self.reconnect_pending {
            return Vec::new();
        }
        self.reconnect_pending = true;
        warn!(
            previous = %previous,
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Price stream closed unexpectedly, scheduling reconnect"
        );
        vec![Command::ScheduleReconnect(self.reconnect_delay)]
    }

    /// Reconnect timer fired.
    pub fn on_reconnect_timer(&mut self) -> Vec<Command> {
        if !self.reconnect_pending {
            debug!("Ignoring stale reconnect timer");
            return Vec::new();
        }
        self.reconnect_pending = false;

        if self.manual_disconnect || self.state != ConnectionState::Disconnected {
            return Vec::new();
        }
        info!("Reconnecting price stream");
        self.resume()
    }

    fn update_subscription(&mut self, symbols: Vec<String>) -> Vec<Command> {
        let diff = self.subscriptions.diff(&symbols);
        let mut commands = Vec::with_capacity(2);

        if !diff.unsubscribe.is_empty() {
            debug!(symbols = ?diff.unsubscribe, "Unsubscribing");
            commands.push(Command::Send(ControlMessage::unsubscribe(diff.unsubscribe)));
        }
        if !diff.subscribe.is_empty() {
            debug!(symbols = ?diff.subscribe, "Subscribing");
            commands.push(Command::Send(ControlMessage::subscribe(diff.subscribe)));
        }

        self.subscriptions.replace(symbols);
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn open_with(symbols: &[&str]) -> PriceStreamState {
        let mut sm = PriceStreamState::default();
        assert_eq!(sm.connect(strings(symbols)), vec![Command::OpenTransport]);
        sm.on_open();
        sm
    }

    #[test]
    fn test_connect_opens_transport_once() {
        let mut sm = PriceStreamState::default();
        assert_eq!(sm.connect(strings(&["BTC"])), vec![Command::OpenTransport]);
        assert_eq!(sm.state(), ConnectionState::Connecting);

        // Second connect while connecting must not open another transport.
        assert!(sm.connect(strings(&["BTC", "ETH"])).is_empty());
        assert_eq!(sm.subscribed_symbols(), strings(&["BTC", "ETH"]).as_slice());
    }

    #[test]
    fn test_open_subscribes_to_pending_symbols() {
        let mut sm = PriceStreamState::default();
        sm.connect(strings(&["BTC"]));
        sm.connect(strings(&["BTC", "ETH"]));

        let commands = sm.on_open();
        assert_eq!(
            commands,
            vec![Command::Send(ControlMessage::subscribe(strings(&["BTC", "ETH"])))]
        );
        assert!(sm.is_connected());
    }

    #[test]
    fn test_open_with_no_symbols_sends_nothing() {
        let mut sm = PriceStreamState::default();
        sm.connect(Vec::new());
        assert!(sm.on_open().is_empty());
        assert!(sm.is_connected());
    }

    #[test]
    fn test_update_while_open_unsubscribes_then_subscribes() {
        let mut sm = open_with(&["BTC", "ETH"]);

        let commands = sm.connect(strings(&["ETH", "SOL"]));
        assert_eq!(
            commands,
            vec![
                Command::Send(ControlMessage::unsubscribe(strings(&["BTC"]))),
                Command::Send(ControlMessage::subscribe(strings(&["SOL"]))),
            ]
        );
        assert_eq!(sm.subscribed_symbols(), strings(&["ETH", "SOL"]).as_slice());
        assert_eq!(sm.state(), ConnectionState::Open);
    }

    #[test]
    fn test_update_with_same_symbols_is_silent() {
        let mut sm = open_with(&["BTC", "ETH"]);
        assert!(sm.connect(strings(&["ETH", "BTC"])).is_empty());
    }

    #[test]
    fn test_unexpected_close_schedules_single_reconnect() {
        let mut sm = open_with(&["BTC"]);

        sm.on_error("connection reset");
        assert_eq!(
            sm.on_close(),
            vec![Command::ScheduleReconnect(DEFAULT_RECONNECT_DELAY)]
        );
        assert_eq!(sm.state(), ConnectionState::Disconnected);
        assert!(sm.is_reconnect_pending());

        // A duplicate close must not arm a second timer.
        assert!(sm.on_close().is_empty());
    }

    #[test]
    fn test_reconnect_timer_resubscribes_last_symbols() {
        let mut sm = open_with(&["BTC", "ETH"]);
        sm.on_close();

        assert_eq!(sm.on_reconnect_timer(), vec![Command::OpenTransport]);
        assert_eq!(
            sm.on_open(),
            vec![Command::Send(ControlMessage::subscribe(strings(&["BTC", "ETH"])))]
        );
    }

    #[test]
    fn test_failed_open_schedules_reconnect() {
        let mut sm = PriceStreamState::default();
        sm.connect(strings(&["BTC"]));
        assert_eq!(
            sm.on_close(),
            vec![Command::ScheduleReconnect(DEFAULT_RECONNECT_DELAY)]
        );
    }

    #[test]
    fn test_disconnect_cancels_pending_reconnect() {
        let mut sm = open_with(&["BTC"]);
        sm.on_close();

        assert_eq!(sm.disconnect(), vec![Command::CancelReconnect]);
        assert!(!sm.is_reconnect_pending());
        // Even if the timer raced and fired, nothing happens.
        assert!(sm.on_reconnect_timer().is_empty());
        assert_eq!(sm.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_manual_disconnect_closes_without_reconnect() {
        let mut sm = open_with(&["BTC"]);

        assert_eq!(sm.disconnect(), vec![Command::CloseTransport]);
        assert_eq!(sm.state(), ConnectionState::Closing);
        assert!(sm.on_close().is_empty());
        assert_eq!(sm.state(), ConnectionState::Disconnected);
        assert!(sm.is_manual_disconnect());
    }

    #[test]
    fn test_disconnect_retains_symbols_for_resume() {
        let mut sm = open_with(&["BTC", "ETH"]);
        sm.disconnect();
        sm.on_close();

        assert_eq!(sm.subscribed_symbols(), strings(&["BTC", "ETH"]).as_slice());
        assert_eq!(sm.resume(), vec![Command::OpenTransport]);
        assert!(!sm.is_manual_disconnect());
        assert_eq!(
            sm.on_open(),
            vec![Command::Send(ControlMessage::subscribe(strings(&["BTC", "ETH"])))]
        );
    }

    #[test]
    fn test_connect_while_closing_reopens_after_close() {
        let mut sm = open_with(&["BTC"]);
        sm.disconnect();

        assert!(sm.connect(strings(&["SOL"])).is_empty());
        assert_eq!(sm.on_close(), vec![Command::OpenTransport]);
        assert_eq!(sm.state(), ConnectionState::Connecting);
        assert_eq!(
            sm.on_open(),
            vec![Command::Send(ControlMessage::subscribe(strings(&["SOL"])))]
        );
    }

    #[test]
    fn test_disconnect_while_connecting() {
        let mut sm = PriceStreamState::default();
        sm.connect(strings(&["BTC"]));
        assert_eq!(sm.disconnect(), vec![Command::CloseTransport]);
        assert!(sm.on_close().is_empty());
        // A late open from the aborted handshake is ignored.
        assert!(sm.on_open().is_empty());
        assert!(!sm.is_connected());
    }

    #[test]
    fn test_connect_during_backoff_cancels_timer() {
        let mut sm = open_with(&["BTC"]);
        sm.on_close();

        assert_eq!(
            sm.connect(strings(&["ETH"])),
            vec![Command::CancelReconnect, Command::OpenTransport]
        );
        assert!(!sm.is_reconnect_pending());
    }

    #[test]
    fn test_price_update_is_delivered() {
        let mut sm = open_with(&["BTC"]);
        let commands = sm.on_message(
            r#"{"type":"price_update","data":{"symbol":"BTC","price":1.5,"timestamp":7}}"#,
        );
        assert_eq!(
            commands,
            vec![Command::Deliver(PriceUpdate::new("BTC", 1.5, 7))]
        );
    }

    #[test]
    fn test_informational_and_malformed_frames_do_not_change_state() {
        let mut sm = open_with(&["BTC"]);
        assert!(sm.on_message(r#"{"type":"connected","message":"hi"}"#).is_empty());
        assert!(sm
            .on_message(r#"{"type":"subscription_confirmed","symbols":["BTC"]}"#)
            .is_empty());
        assert!(sm.on_message("{garbage").is_empty());
        assert_eq!(sm.malformed_frames(), 1);

        assert_eq!(sm.state(), ConnectionState::Open);
        assert_eq!(sm.subscribed_symbols(), strings(&["BTC"]).as_slice());
    }

    #[test]
    fn test_custom_reconnect_delay() {
        let delay = Duration::from_millis(250);
        let mut sm = PriceStreamState::new(delay);
        sm.connect(strings(&["BTC"]));
        sm.on_open();
        assert_eq!(sm.on_close(), vec![Command::ScheduleReconnect(delay)]);
    }
}
