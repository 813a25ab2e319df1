//! Connection driver task.
//!
//! One driver per `connect()` call. The driver owns the socket for its
//! whole life: dial, register, event loop, close bookkeeping, and the
//! retry loop around all of it. Every socket callback the transport
//! surfaces (open, message, error, close) is processed sequentially here,
//! so no other task ever touches connection state mid-event.

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use relaylink_proto::{decode, encode, normalize, Frame, RegisterPayload};

use crate::client::{ConnectionState, Shared};
use crate::heartbeat::Heartbeat;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Spawn the driver for a session.
pub(crate) fn spawn(shared: Arc<Shared>) -> JoinHandle<()> {
    tokio::spawn(run(shared))
}

async fn run(shared: Arc<Shared>) {
    loop {
        shared.state.lock().phase = ConnectionState::Connecting;

        // Fail closed when no token is available: warn and leave the
        // session disconnected instead of dialing unauthenticated.
        let Some(token) = shared.tokens.bearer_token() else {
            warn!("no bearer token available; not opening a socket");
            shared.state.lock().phase = ConnectionState::Disconnected;
            return;
        };

        let url = format!("{}?token={}", shared.endpoint_url, token);
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!(url = %shared.endpoint_url, "relay connection open");
                run_session(&shared, socket).await;
            }
            Err(error) => {
                warn!(url = %shared.endpoint_url, error = %error, "relay connect failed");
                shared.state.lock().phase = ConnectionState::Disconnected;
                shared.notify_connection(false);
            }
        }

        let next_delay = {
            let mut state = shared.state.lock();
            match shared.policy.next_delay(state.reconnect_attempts) {
                Some(delay) => {
                    state.reconnect_attempts += 1;
                    state.phase = ConnectionState::Reconnecting;
                    Some((state.reconnect_attempts, delay))
                }
                None => None,
            }
        };

        match next_delay {
            Some((attempt, delay)) => {
                info!(
                    attempt = attempt,
                    max_attempts = shared.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                sleep(delay).await;
            }
            None => {
                if shared.policy.auto_reconnect {
                    warn!(
                        max_attempts = shared.policy.max_attempts,
                        "reconnect budget exhausted; staying disconnected until an explicit connect"
                    );
                } else {
                    info!("auto-reconnect disabled; staying disconnected");
                }
                return;
            }
        }
    }
}

/// Drive one physical socket from open to close.
async fn run_session(shared: &Shared, socket: WsStream) {
    let (mut sink, mut stream) = socket.split();

    shared.state.lock().phase = ConnectionState::Open;

    // Registration is the first frame on every fresh socket, sent before
    // the outbound queue is installed so nothing can jump ahead of it.
    let register = Frame::Register(RegisterPayload {
        user_id: shared.user_id.clone(),
    });
    if !send_frame(&mut sink, &register).await {
        end_session(shared);
        return;
    }

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    {
        let mut state = shared.state.lock();
        state.is_registered = true;
        state.reconnect_attempts = 0;
        state.outbound = Some(outbound_tx);
        state.phase = ConnectionState::Ready;
    }
    info!(user_id = %shared.user_id, "registered with relay");
    shared.notify_connection(true);

    let mut heartbeat = Heartbeat::new(shared.heartbeat_interval);

    loop {
        tokio::select! {
            queued = outbound_rx.recv() => {
                match queued {
                    Some(frame) => {
                        if !send_frame(&mut sink, &frame).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                // Best-effort: a failed ping is logged and the ticker keeps
                // going; real link death arrives as a stream error/close.
                if !send_frame(&mut sink, &Frame::Ping).await {
                    warn!("keepalive ping failed");
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_text(shared, &mut sink, &text).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("relay closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Transport-level ping/pong/binary frames are
                        // tungstenite's concern.
                    }
                    Some(Err(error)) => {
                        warn!(error = %error, "relay stream error");
                        break;
                    }
                    None => {
                        info!("relay connection ended");
                        break;
                    }
                }
            }
        }
    }

    end_session(shared);
}

/// Route one inbound text frame.
async fn dispatch_text(shared: &Shared, sink: &mut WsSink, text: &str) {
    let frame = match decode(text) {
        Ok(frame) => frame,
        Err(error) => {
            warn!(error = %error, "dropping undecodable frame");
            return;
        }
    };

    match frame {
        Frame::Ping => {
            // Reply immediately rather than waiting for the next
            // heartbeat tick.
            if !send_frame(sink, &Frame::Pong).await {
                warn!("failed to answer relay ping");
            }
        }
        Frame::Pong => {
            trace!("pong from relay");
        }
        Frame::Unknown(tag) => {
            debug!(tag = tag.as_deref().unwrap_or("<none>"), "dropping unrecognized frame");
        }
        other => {
            let kind = other.kind();
            match normalize(other) {
                Some(event) => shared.emit(event),
                None => debug!(kind = kind, "ignoring client-bound frame"),
            }
        }
    }
}

/// Encode and send one frame; returns `false` when the socket is gone.
async fn send_frame(sink: &mut WsSink, frame: &Frame) -> bool {
    let text = match encode(frame) {
        Ok(text) => text,
        Err(error) => {
            warn!(kind = frame.kind(), error = %error, "frame failed to encode");
            return true;
        }
    };

    match sink.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(error) => {
            warn!(kind = frame.kind(), error = %error, "send failed");
            false
        }
    }
}

/// Close bookkeeping shared by every session exit path.
fn end_session(shared: &Shared) {
    {
        let mut state = shared.state.lock();
        state.outbound = None;
        state.is_registered = false;
        state.phase = ConnectionState::Disconnected;
    }
    shared.notify_connection(false);
}
