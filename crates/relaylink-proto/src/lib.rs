//! # relaylink-proto
//!
//! Wire codec and message normalizer for the relaylink messaging protocol.
//!
//! The relay speaks JSON text frames over a WebSocket. This crate is the
//! pure layer of the client: it decodes raw payloads into a closed
//! [`Frame`] variant set, serializes the frames a client sends, and maps
//! both inbound chat-message shapes (tagged and legacy) onto one canonical
//! [`IncomingMessage`] event so that application code never observes the
//! wire format.
//!
//! ## Quick start
//!
//! ```rust
//! use relaylink_proto::{decode, normalize, InboundEvent};
//!
//! let raw = r#"{"senderId":"u2","content":"hey"}"#;
//! let frame = decode(raw).expect("valid frame");
//! match normalize(frame) {
//!     Some(InboundEvent::Message(msg)) => {
//!         assert_eq!(msg.content, "hey");
//!         // Legacy frames carry no display name; a sentinel is used.
//!         assert_eq!(msg.sender.name, relaylink_proto::UNKNOWN_SENDER_NAME);
//!     }
//!     other => panic!("unexpected event: {:?}", other),
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod normalize;

pub use self::error::{DecodeError, EncodeError};
pub use self::frame::{
    decode, encode, AckPayload, Frame, LegacyReceivePayload, ReceivePayload, RegisterPayload,
    SendPayload, WireSender,
};
pub use self::normalize::{
    normalize, AckMessage, InboundEvent, IncomingMessage, SenderProfile, DEFAULT_DELIVERY_STATUS,
    UNKNOWN_CONVERSATION_ID, UNKNOWN_SENDER_NAME,
};
