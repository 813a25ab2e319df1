//! Connection manager: socket lifecycle, session state, and event dispatch.
//!
//! One [`RelayClient`] maintains one logical connection to the relay. The
//! socket itself is exclusively owned by a driver task (see [`driver`]);
//! the public handle only spawns/aborts that task and inspects the shared
//! session record. Events reach the application through two callback
//! slots: one for normalized inbound events, one for connection-state
//! changes.

mod driver;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use relaylink_proto::{Frame, InboundEvent, SendPayload};

use crate::config::RelayConfig;
use crate::error::SendRejection;
use crate::reconnect::ReconnectPolicy;
use crate::token::TokenStore;

/// Connection lifecycle phase.
///
/// `Reconnecting` is a labeled variant of disconnected-with-pending-timer:
/// no socket exists, but a retry is scheduled. Explicit [`RelayClient::disconnect`]
/// always lands in `Disconnected` and cancels any pending retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no pending retry.
    Disconnected,
    /// A socket open is in flight.
    Connecting,
    /// Socket open, registration frame not yet sent.
    Open,
    /// Registered with the relay; the session is usable.
    Ready,
    /// Waiting out the reconnect delay after an unexpected close.
    Reconnecting,
}

/// Callback invoked once per normalized inbound event.
pub type MessageCallback = Arc<dyn Fn(InboundEvent) + Send + Sync>;

/// Callback invoked on every connection-state change, with `true` on open
/// and `false` on error/close.
pub type ConnectionCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Per-client options supplied at construction.
///
/// File configuration ([`RelayConfig`]) provides the endpoint and tuning
/// defaults; anything set here wins over the file values.
pub struct ClientOptions {
    user_id: String,
    on_message: Option<MessageCallback>,
    on_connection_change: Option<ConnectionCallback>,
    auto_reconnect: Option<bool>,
    reconnect_delay: Option<Duration>,
    max_reconnect_attempts: Option<u32>,
    heartbeat_interval: Option<Duration>,
}

impl ClientOptions {
    /// Options for a session owned by `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            on_message: None,
            on_connection_change: None,
            auto_reconnect: None,
            reconnect_delay: None,
            max_reconnect_attempts: None,
            heartbeat_interval: None,
        }
    }

    /// Set the inbound-event callback.
    pub fn on_message(mut self, callback: impl Fn(InboundEvent) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(callback));
        self
    }

    /// Set the connection-state callback.
    pub fn on_connection_change(mut self, callback: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_connection_change = Some(Arc::new(callback));
        self
    }

    /// Override automatic reconnection.
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = Some(enabled);
        self
    }

    /// Override the fixed reconnect delay.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    /// Override the reconnect attempt bound.
    pub fn max_reconnect_attempts(mut self, max: u32) -> Self {
        self.max_reconnect_attempts = Some(max);
        self
    }

    /// Override the keep-alive interval.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }
}

/// Session bookkeeping shared between the handle and the driver task.
struct SessionState {
    phase: ConnectionState,
    /// True from the moment the registration frame is sent until the
    /// socket closes; guards against ever registering twice on one socket.
    is_registered: bool,
    /// Retries scheduled since the last successful open.
    reconnect_attempts: u32,
    /// Present exactly while a socket is open; dropping it severs the
    /// driver's outbound queue.
    outbound: Option<mpsc::UnboundedSender<Frame>>,
}

pub(crate) struct Shared {
    endpoint_url: String,
    user_id: String,
    heartbeat_interval: Duration,
    policy: ReconnectPolicy,
    tokens: Arc<dyn TokenStore>,
    on_message: Option<MessageCallback>,
    on_connection_change: Option<ConnectionCallback>,
    state: Mutex<SessionState>,
}

impl Shared {
    pub(crate) fn notify_connection(&self, connected: bool) {
        if let Some(callback) = &self.on_connection_change {
            callback(connected);
        }
    }

    pub(crate) fn emit(&self, event: InboundEvent) {
        if let Some(callback) = &self.on_message {
            callback(event);
        }
    }
}

/// Resilient client for one logical relay connection.
///
/// `connect` spawns a driver task that owns the socket, registers once per
/// physical connection, keeps the link alive with heartbeats, and retries
/// unexpected closes under the configured [`ReconnectPolicy`].
/// `disconnect` is the only path that guarantees no further automatic
/// reconnection; dropping the client does *not* close the connection, so
/// a session can deliberately outlive a single view.
pub struct RelayClient {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl RelayClient {
    /// Build a client from file configuration, per-session options, and a
    /// token store.
    pub fn new(
        config: &RelayConfig,
        options: ClientOptions,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let tuning = &config.session;
        let policy = ReconnectPolicy {
            auto_reconnect: options.auto_reconnect.unwrap_or(tuning.auto_reconnect),
            delay: options
                .reconnect_delay
                .unwrap_or_else(|| tuning.reconnect_delay()),
            max_attempts: options
                .max_reconnect_attempts
                .unwrap_or(tuning.max_reconnect_attempts),
        };

        let shared = Shared {
            endpoint_url: config.relay.url(),
            user_id: options.user_id,
            heartbeat_interval: options
                .heartbeat_interval
                .unwrap_or_else(|| tuning.heartbeat_interval()),
            policy,
            tokens,
            on_message: options.on_message,
            on_connection_change: options.on_connection_change,
            state: Mutex::new(SessionState {
                phase: ConnectionState::Disconnected,
                is_registered: false,
                reconnect_attempts: 0,
                outbound: None,
            }),
        };

        Self {
            shared: Arc::new(shared),
            driver: Mutex::new(None),
        }
    }

    /// Open the connection.
    ///
    /// Returns immediately; completion is observed through the
    /// connection-state callback. A no-op while a connection (or a
    /// scheduled retry) is already live. Requires a non-empty user id and
    /// an available bearer token; both failures log and leave the client
    /// disconnected rather than erroring.
    pub fn connect(&self) {
        if self.shared.user_id.is_empty() {
            warn!("connect requested without a user id");
            return;
        }

        let mut slot = self.driver.lock();
        if let Some(handle) = slot.as_ref() {
            if !handle.is_finished() {
                debug!("connect ignored: connection already active");
                return;
            }
        }

        self.shared.state.lock().phase = ConnectionState::Connecting;
        *slot = Some(driver::spawn(Arc::clone(&self.shared)));
    }

    /// Alias for [`connect`](Self::connect), for callers recovering after
    /// an exhausted retry budget.
    pub fn reconnect(&self) {
        self.connect();
    }

    /// Close the connection and cancel all timers.
    ///
    /// Aborting the driver task synchronously cancels the heartbeat ticker
    /// and any pending reconnect sleep, so no stale timer can open a
    /// socket after teardown.
    pub fn disconnect(&self) {
        if let Some(handle) = self.driver.lock().take() {
            handle.abort();
        }

        {
            let mut state = self.shared.state.lock();
            state.outbound = None;
            state.is_registered = false;
            state.phase = ConnectionState::Disconnected;
        }

        self.shared.notify_connection(false);
        info!("relay connection closed by local request");
    }

    /// Send a chat message to `receiver_id`.
    ///
    /// Never blocks and never panics: the frame is queued for the driver
    /// task and the delivery acknowledgement arrives later as an
    /// [`InboundEvent::Ack`]. Returns `false` (with a warn log) when there
    /// is no open socket, the user id is empty, or `content` trims to
    /// empty.
    pub fn send_message(
        &self,
        receiver_id: &str,
        content: &str,
        conversation_id: Option<&str>,
    ) -> bool {
        match self.try_send(receiver_id, content, conversation_id) {
            Ok(()) => true,
            Err(rejection) => {
                warn!(reason = rejection.reason(), "outbound message rejected");
                false
            }
        }
    }

    fn try_send(
        &self,
        receiver_id: &str,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<(), SendRejection> {
        if self.shared.user_id.is_empty() {
            return Err(SendRejection::EmptyUserId);
        }
        if content.trim().is_empty() {
            return Err(SendRejection::EmptyContent);
        }

        let state = self.shared.state.lock();
        let outbound = state.outbound.as_ref().ok_or(SendRejection::NotConnected)?;

        let frame = Frame::Send(SendPayload {
            sender_id: self.shared.user_id.clone(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            conversation_id: conversation_id.map(str::to_string),
        });
        outbound.send(frame).map_err(|_| SendRejection::NotConnected)
    }

    /// Whether a socket is currently open.
    pub fn is_connected(&self) -> bool {
        matches!(
            self.shared.state.lock().phase,
            ConnectionState::Open | ConnectionState::Ready
        )
    }

    /// Current connection phase.
    pub fn state(&self) -> ConnectionState {
        self.shared.state.lock().phase
    }
}
