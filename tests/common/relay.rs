//! In-process fake relay server.
//!
//! Accepts WebSocket connections from the client under test, records every
//! decoded inbound frame, and lets tests script outbound traffic and
//! connection drops.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

use relaylink::RelayConfig;
use relaylink_proto::{decode, Frame};

/// Events observed by the fake relay, across all successive connections.
#[derive(Debug)]
pub enum RelayEvent {
    /// A client completed the WebSocket handshake; carries the request
    /// path (including the token query).
    Connected { path: String },
    /// A decoded frame received from the client.
    Frame(Frame),
    /// A connection ended.
    Closed,
}

/// A fake relay listening on a random local port.
pub struct TestRelay {
    addr: SocketAddr,
    events: mpsc::UnboundedReceiver<RelayEvent>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>,
    accepted: Arc<AtomicUsize>,
}

#[allow(dead_code)] // each test binary uses a subset of the helpers
impl TestRelay {
    /// Spawn a relay that completes handshakes and records traffic.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_inner(false).await
    }

    /// Spawn a relay that accepts TCP connections but kills them before
    /// the WebSocket handshake completes, so every dial fails.
    pub async fn spawn_refusing() -> anyhow::Result<Self> {
        Self::spawn_inner(true).await
    }

    async fn spawn_inner(refuse: bool) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (event_tx, events) = mpsc::unbounded_channel();
        let current: Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>> =
            Arc::new(Mutex::new(None));
        let accepted = Arc::new(AtomicUsize::new(0));

        {
            let current = Arc::clone(&current);
            let accepted = Arc::clone(&accepted);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _peer)) = listener.accept().await else {
                        break;
                    };
                    accepted.fetch_add(1, Ordering::SeqCst);
                    if refuse {
                        drop(stream);
                        continue;
                    }
                    let event_tx = event_tx.clone();
                    let current = Arc::clone(&current);
                    tokio::spawn(handle_connection(stream, event_tx, current));
                }
            });
        }

        Ok(Self {
            addr,
            events,
            current,
            accepted,
        })
    }

    /// Client configuration pointing at this relay.
    pub fn config(&self) -> RelayConfig {
        toml::from_str(&format!(
            r#"
            [relay]
            scheme = "ws"
            host = "127.0.0.1"
            port = {}
            path = "/ws"
            "#,
            self.addr.port()
        ))
        .expect("relay test config parses")
    }

    /// Total TCP connections accepted so far (dial attempts observed).
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` connections have been accepted.
    pub async fn wait_for_accepts(&self, n: usize, dur: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + dur;
        while self.accepted() < n {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("only {} of {} dials within {:?}", self.accepted(), n, dur);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }

    /// Receive the next event with a timeout.
    pub async fn next_event_timeout(&mut self, dur: Duration) -> anyhow::Result<RelayEvent> {
        match timeout(dur, self.events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => anyhow::bail!("relay event channel closed"),
            Err(_) => anyhow::bail!("no relay event within {:?}", dur),
        }
    }

    /// Receive the next event (5s timeout).
    pub async fn next_event(&mut self) -> anyhow::Result<RelayEvent> {
        self.next_event_timeout(Duration::from_secs(5)).await
    }

    /// Expect the next event to be a completed handshake; returns the
    /// request path.
    pub async fn expect_connected(&mut self) -> anyhow::Result<String> {
        match self.next_event().await? {
            RelayEvent::Connected { path } => Ok(path),
            other => anyhow::bail!("expected handshake, got {:?}", other),
        }
    }

    /// Expect the next event to be a frame.
    pub async fn expect_frame(&mut self) -> anyhow::Result<Frame> {
        match self.next_event().await? {
            RelayEvent::Frame(frame) => Ok(frame),
            other => anyhow::bail!("expected frame, got {:?}", other),
        }
    }

    /// Skip events until the next completed handshake; returns the
    /// request path. Useful across reconnects, where `Closed` events from
    /// earlier connections interleave.
    pub async fn next_connected(&mut self) -> anyhow::Result<String> {
        loop {
            if let RelayEvent::Connected { path } = self.next_event().await? {
                return Ok(path);
            }
        }
    }

    /// Skip events until the current connection reports closed.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            if let RelayEvent::Closed = self.next_event().await? {
                return Ok(());
            }
        }
    }

    /// Receive frames until the predicate matches, skipping events that
    /// don't (keep-alive pings, closes of earlier connections).
    pub async fn frame_matching<F>(&mut self, mut predicate: F) -> anyhow::Result<Frame>
    where
        F: FnMut(&Frame) -> bool,
    {
        loop {
            if let RelayEvent::Frame(frame) = self.next_event().await? {
                if predicate(&frame) {
                    return Ok(frame);
                }
            }
        }
    }

    /// Assert that nothing at all arrives for `dur`.
    pub async fn assert_silent(&mut self, dur: Duration) -> anyhow::Result<()> {
        match timeout(dur, self.events.recv()).await {
            Err(_) => Ok(()),
            Ok(event) => anyhow::bail!("expected silence, got {:?}", event),
        }
    }

    /// Push a raw JSON value to the currently connected client.
    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(value.to_string());
    }

    /// Push raw text (possibly malformed) to the currently connected client.
    pub fn send_text(&self, text: impl Into<String>) {
        if let Some(tx) = self.current.lock().as_ref() {
            let _ = tx.send(Message::Text(text.into()));
        }
    }

    /// Close the current connection from the relay side.
    pub fn drop_connection(&self) {
        *self.current.lock() = None;
    }
}

async fn handle_connection(
    stream: TcpStream,
    event_tx: mpsc::UnboundedSender<RelayEvent>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>,
) {
    let path = Arc::new(Mutex::new(String::new()));
    let path_probe = Arc::clone(&path);
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        *path_probe.lock() = req.uri().to_string();
        Ok(resp)
    };

    let socket = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(socket) => socket,
        Err(_) => return,
    };

    let _ = event_tx.send(RelayEvent::Connected {
        path: path.lock().clone(),
    });

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    *current.lock() = Some(outbound_tx);

    let (mut sink, mut source) = socket.split();
    loop {
        tokio::select! {
            queued = outbound_rx.recv() => {
                match queued {
                    Some(message) => {
                        if sink.send(message).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Test dropped the handle: close from the relay side.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            inbound = source.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(frame) = decode(&text) {
                            let _ = event_tx.send(RelayEvent::Frame(frame));
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = event_tx.send(RelayEvent::Closed);
}
