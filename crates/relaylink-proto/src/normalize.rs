//! Normalization of decoded frames into the canonical event model.
//!
//! Application code never sees the wire shapes: both the tagged and the
//! legacy chat-message variants are mapped onto one [`IncomingMessage`]
//! here, and acknowledgements onto [`AckMessage`]. Control frames and
//! unrecognized traffic normalize to nothing.

use serde::{Deserialize, Serialize};

use crate::frame::{AckPayload, Frame, LegacyReceivePayload, ReceivePayload};

/// Display-name sentinel for legacy messages, which carry no sender name.
///
/// Consumers that need a real name must enrich via a profile lookup; this
/// layer does not invent one.
pub const UNKNOWN_SENDER_NAME: &str = "Unknown";

/// Conversation-id sentinel for legacy messages that omit one.
pub const UNKNOWN_CONVERSATION_ID: &str = "unknown";

/// Delivery-status sentinel for legacy messages that omit one.
pub const DEFAULT_DELIVERY_STATUS: &str = "RECEIVED";

/// Sender profile attached to a canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderProfile {
    /// Sender user id.
    pub id: String,
    /// Display name, or [`UNKNOWN_SENDER_NAME`] for legacy messages.
    pub name: String,
    /// Email address, empty for legacy messages.
    pub email: String,
    /// Avatar URL, if the sender has one.
    pub avatar_url: Option<String>,
}

/// The one chat-message shape delivered to application code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Who sent the message.
    pub sender: SenderProfile,
    /// Message body.
    pub content: String,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Delivery status label.
    pub status: String,
    /// Display timestamp.
    pub timestamp: String,
}

/// Delivery acknowledgement for a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    /// Delivery status reported by the relay.
    pub status: String,
    /// Id of the acknowledged message, when reported.
    pub message_id: Option<String>,
    /// Conversation of the acknowledged message, when reported.
    pub conversation_id: Option<String>,
}

/// Event delivered to the application's message callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A peer-to-peer chat message, in canonical form.
    Message(IncomingMessage),
    /// A delivery acknowledgement.
    Ack(AckMessage),
}

/// Map a decoded frame onto the canonical event model.
///
/// Returns `None` for frames that are handled by the connection layer
/// (ping/pong) or dropped (unknown, client-bound shapes). Total: never
/// panics for any decoded frame.
pub fn normalize(frame: Frame) -> Option<InboundEvent> {
    match frame {
        Frame::Receive(payload) => Some(InboundEvent::Message(from_tagged(payload))),
        Frame::LegacyReceive(payload) => Some(InboundEvent::Message(from_legacy(payload))),
        Frame::Ack(payload) => Some(InboundEvent::Ack(from_ack(payload))),
        Frame::Register(_)
        | Frame::Send(_)
        | Frame::Ping
        | Frame::Pong
        | Frame::Unknown(_) => None,
    }
}

fn from_tagged(payload: ReceivePayload) -> IncomingMessage {
    IncomingMessage {
        sender: SenderProfile {
            id: payload.sender.id,
            name: payload.sender.name,
            email: payload.sender.email,
            avatar_url: payload.sender.avatar_url,
        },
        content: payload.content,
        conversation_id: payload.conversation_id,
        status: payload.status,
        timestamp: payload.timestamp,
    }
}

fn from_legacy(payload: LegacyReceivePayload) -> IncomingMessage {
    IncomingMessage {
        sender: SenderProfile {
            id: payload.sender_id,
            // The legacy shape has no display name; keep the sentinel
            // rather than inventing one.
            name: UNKNOWN_SENDER_NAME.to_string(),
            email: String::new(),
            avatar_url: None,
        },
        content: payload.content,
        conversation_id: payload
            .conversation_id
            .unwrap_or_else(|| UNKNOWN_CONVERSATION_ID.to_string()),
        status: payload
            .status
            .unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string()),
        timestamp: payload.timestamp.unwrap_or_else(now_display),
    }
}

fn from_ack(payload: AckPayload) -> AckMessage {
    AckMessage {
        status: payload.status,
        message_id: payload.message_id,
        conversation_id: payload.conversation_id,
    }
}

/// Current local wall-clock time in the relay's display format.
fn now_display() -> String {
    chrono::Local::now().format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{decode, RegisterPayload, SendPayload, WireSender};

    #[test]
    fn test_tagged_message_passes_through() {
        let frame = Frame::Receive(ReceivePayload {
            sender: WireSender {
                id: "u2".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            },
            content: "hi".to_string(),
            conversation_id: "c1".to_string(),
            status: "RECEIVED".to_string(),
            timestamp: "01/01/2025 10:00".to_string(),
        });

        match normalize(frame) {
            Some(InboundEvent::Message(msg)) => {
                assert_eq!(msg.sender.name, "Alice");
                assert_eq!(msg.content, "hi");
                assert_eq!(msg.conversation_id, "c1");
                assert_eq!(msg.timestamp, "01/01/2025 10:00");
            }
            other => panic!("expected Message, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_message_gets_sentinels() {
        let frame = decode(r#"{"senderId":"u2","content":"hey"}"#).unwrap();
        match normalize(frame) {
            Some(InboundEvent::Message(msg)) => {
                assert_eq!(msg.sender.id, "u2");
                assert_eq!(msg.sender.name, UNKNOWN_SENDER_NAME);
                assert_eq!(msg.sender.email, "");
                assert_eq!(msg.sender.avatar_url, None);
                assert_eq!(msg.conversation_id, UNKNOWN_CONVERSATION_ID);
                assert_eq!(msg.status, DEFAULT_DELIVERY_STATUS);
                assert!(!msg.timestamp.is_empty(), "timestamp must be fabricated");
            }
            other => panic!("expected Message, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_message_keeps_present_fields() {
        let frame = decode(
            r#"{"senderId":"u2","content":"hey","conversationId":"c3","status":"READ","timestamp":"02/02/2025 08:30"}"#,
        )
        .unwrap();
        match normalize(frame) {
            Some(InboundEvent::Message(msg)) => {
                assert_eq!(msg.conversation_id, "c3");
                assert_eq!(msg.status, "READ");
                assert_eq!(msg.timestamp, "02/02/2025 08:30");
                // The name sentinel applies even when everything else is present.
                assert_eq!(msg.sender.name, UNKNOWN_SENDER_NAME);
            }
            other => panic!("expected Message, got {:?}", other),
        }
    }

    #[test]
    fn test_ack_surfaces() {
        let frame = Frame::Ack(AckPayload {
            status: "DELIVERED".to_string(),
            message_id: Some("m1".to_string()),
            conversation_id: None,
        });
        match normalize(frame) {
            Some(InboundEvent::Ack(ack)) => {
                assert_eq!(ack.status, "DELIVERED");
                assert_eq!(ack.message_id.as_deref(), Some("m1"));
            }
            other => panic!("expected Ack, got {:?}", other),
        }
    }

    #[test]
    fn test_control_and_unknown_produce_nothing() {
        assert_eq!(normalize(Frame::Ping), None);
        assert_eq!(normalize(Frame::Pong), None);
        assert_eq!(normalize(Frame::Unknown(Some("presence".to_string()))), None);
        assert_eq!(
            normalize(Frame::Register(RegisterPayload {
                user_id: "u1".to_string()
            })),
            None
        );
        assert_eq!(
            normalize(Frame::Send(SendPayload {
                sender_id: "u1".to_string(),
                receiver_id: "u2".to_string(),
                content: "x".to_string(),
                conversation_id: None,
            })),
            None
        );
    }
}
