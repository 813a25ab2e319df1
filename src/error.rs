//! Error handling for the relaylink client.
//!
//! Nothing in this crate escapes to application code as a panic or an
//! error return: transport failures surface through the connection-change
//! callback and logs, decode failures are dropped at the codec boundary,
//! and send failures are a boolean return. The types here give those
//! boolean/logged failures stable, structured reasons.

use thiserror::Error;

/// Reasons an outbound message is rejected locally, before any frame is
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejection {
    /// No open socket to send on.
    #[error("not connected to the relay")]
    NotConnected,

    /// The session was constructed without a user id.
    #[error("user id is empty")]
    EmptyUserId,

    /// Message content is empty after trimming.
    #[error("message content is empty")]
    EmptyContent,
}

impl SendRejection {
    /// Get a static reason string for structured logging.
    #[inline]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::EmptyUserId => "empty_user_id",
            Self::EmptyContent => "empty_content",
        }
    }
}
