//! Wire frame decoding and encoding.
//!
//! The relay speaks JSON text frames discriminated by a `type` tag. Older
//! deployments also emit an untagged chat-message shape that carries a bare
//! `senderId`; it is folded into the same closed variant set here so that
//! nothing downstream ever probes raw fields.
//!
//! Decoding precedence:
//! 1. An explicit, recognized `type` tag is authoritative.
//! 2. No tag but a `senderId` key: legacy chat message.
//! 3. Anything else decodes as [`Frame::Unknown`] (kept, with its tag, for
//!    logging) rather than an error, so unrecognized-but-valid traffic can
//!    be dropped quietly.
//!
//! Malformed text is a [`DecodeError`]; callers log and drop it without
//! touching the connection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};

/// `type` tag for registration frames.
pub const TYPE_REGISTER: &str = "register";
/// `type` tag for outbound chat-message frames.
pub const TYPE_SEND: &str = "message";
/// `type` tag for inbound chat-message frames.
pub const TYPE_RECEIVE: &str = "message.receive";
/// `type` tag for delivery acknowledgements.
pub const TYPE_ACK: &str = "message.send.ack";
/// `type` tag for keep-alive pings.
pub const TYPE_PING: &str = "ping";
/// `type` tag for keep-alive pongs.
pub const TYPE_PONG: &str = "pong";

/// Registration payload: identifies the connecting user on a fresh socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// Stable user identifier for this session.
    pub user_id: String,
}

/// Outbound chat-message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPayload {
    /// Must equal the session's registered user id.
    pub sender_id: String,
    /// Target user id.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
    /// Omitted on the wire when absent; the relay may infer it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Sender block of a tagged inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSender {
    /// Sender user id.
    pub id: String,
    /// Sender display name.
    pub name: String,
    /// Sender email address; some relay builds omit it.
    #[serde(default)]
    pub email: String,
    /// Avatar URL; the relay sends `null` when the user has none.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Tagged inbound chat-message payload (`message.receive`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePayload {
    /// Full sender profile.
    pub sender: WireSender,
    /// Message body.
    pub content: String,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Delivery status label (e.g. `RECEIVED`).
    pub status: String,
    /// Display timestamp as formatted by the relay.
    pub timestamp: String,
}

/// Untagged legacy chat-message payload.
///
/// Only `senderId` and `content` are guaranteed; everything else is
/// best-effort and filled with sentinels by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyReceivePayload {
    /// Sender user id. This shape carries no display name.
    pub sender_id: String,
    /// Target user id, when present.
    #[serde(default)]
    pub receiver_id: Option<String>,
    /// Message body.
    pub content: String,
    /// Conversation id, when present.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Delivery status, when present.
    #[serde(default)]
    pub status: Option<String>,
    /// Display timestamp, when present.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Delivery acknowledgement payload (`message.send.ack`).
///
/// The relay includes `status` plus whatever correlation fields it has;
/// unrecognized extras are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    /// Delivery status reported by the relay.
    pub status: String,
    /// Id of the acknowledged message, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Conversation of the acknowledged message, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// The closed set of wire frames.
///
/// Every payload the relay can emit decodes into exactly one of these;
/// every frame the client sends serializes from one of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// One-time per-socket registration handshake.
    Register(RegisterPayload),
    /// Client-to-relay chat message.
    Send(SendPayload),
    /// Tagged inbound chat message.
    Receive(ReceivePayload),
    /// Untagged legacy inbound chat message.
    LegacyReceive(LegacyReceivePayload),
    /// Delivery acknowledgement for a previously sent message.
    Ack(AckPayload),
    /// Keep-alive ping.
    Ping,
    /// Keep-alive pong.
    Pong,
    /// Structurally valid JSON that matched no known shape. Carries the
    /// unrecognized `type` tag, if one was present, for logging.
    Unknown(Option<String>),
}

impl Frame {
    /// Static name of the frame variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Register(_) => TYPE_REGISTER,
            Frame::Send(_) => TYPE_SEND,
            Frame::Receive(_) => TYPE_RECEIVE,
            Frame::LegacyReceive(_) => "message.legacy",
            Frame::Ack(_) => TYPE_ACK,
            Frame::Ping => TYPE_PING,
            Frame::Pong => TYPE_PONG,
            Frame::Unknown(_) => "unknown",
        }
    }
}

/// Decode a raw text payload into a [`Frame`].
///
/// Never panics. Returns `Err` only for malformed input (not valid JSON,
/// not an object, or a recognized tag whose `data` does not match its
/// declared shape); anything well-formed but unrecognized is
/// [`Frame::Unknown`].
pub fn decode(raw: &str) -> Result<Frame, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

    match obj.get("type").and_then(Value::as_str) {
        Some(TYPE_REGISTER) => {
            let payload: RegisterPayload = serde_json::from_value(value.clone())?;
            Ok(Frame::Register(payload))
        }
        Some(TYPE_SEND) => {
            let data = obj
                .get("data")
                .cloned()
                .ok_or(DecodeError::MissingData(TYPE_SEND))?;
            Ok(Frame::Send(serde_json::from_value(data)?))
        }
        Some(TYPE_RECEIVE) => {
            let data = obj
                .get("data")
                .cloned()
                .ok_or(DecodeError::MissingData(TYPE_RECEIVE))?;
            Ok(Frame::Receive(serde_json::from_value(data)?))
        }
        Some(TYPE_ACK) => {
            let data = obj
                .get("data")
                .cloned()
                .ok_or(DecodeError::MissingData(TYPE_ACK))?;
            Ok(Frame::Ack(serde_json::from_value(data)?))
        }
        Some(TYPE_PING) => Ok(Frame::Ping),
        Some(TYPE_PONG) => Ok(Frame::Pong),
        Some(other) => Ok(Frame::Unknown(Some(other.to_string()))),
        None => {
            // Legacy relays emit chat messages with no discriminator at
            // all; a bare senderId is the only reliable marker.
            if obj.contains_key("senderId") {
                let payload: LegacyReceivePayload = serde_json::from_value(value.clone())?;
                Ok(Frame::LegacyReceive(payload))
            } else {
                Ok(Frame::Unknown(None))
            }
        }
    }
}

/// Encode a client-sent frame as a JSON text payload.
///
/// Only `Register`, `Send`, `Ping` and `Pong` ever leave the client; the
/// inbound-only variants return [`EncodeError::NotOutbound`].
pub fn encode(frame: &Frame) -> Result<String, EncodeError> {
    let value = match frame {
        Frame::Register(payload) => {
            json!({ "type": TYPE_REGISTER, "userId": payload.user_id })
        }
        Frame::Send(payload) => {
            json!({ "type": TYPE_SEND, "data": payload })
        }
        Frame::Ping => json!({ "type": TYPE_PING }),
        Frame::Pong => json!({ "type": TYPE_PONG }),
        other => return Err(EncodeError::NotOutbound(other.kind())),
    };
    Ok(value.to_string())
}
