//! Error types for the relaylink protocol library.
//!
//! Decode errors are always recoverable: a frame that fails to decode is
//! logged and dropped by the connection layer, never fatal to the link.

use thiserror::Error;

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The payload was not valid JSON, or a payload field had the wrong shape.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed as JSON but was not an object.
    #[error("frame is not a json object")]
    NotAnObject,

    /// A tagged frame was missing its `data` payload.
    #[error("missing data payload for {0} frame")]
    MissingData(&'static str),
}

/// Errors produced while encoding an outbound frame.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The variant is only ever received, never sent by the client.
    #[error("{0} frames are not sent by the client")]
    NotOutbound(&'static str),

    /// Serialization failure (should not occur for well-formed payloads).
    #[error("serialize error: {0}")]
    Json(#[from] serde_json::Error),
}
