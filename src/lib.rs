//! # relaylink
//!
//! Resilient real-time messaging client for the relaylink message relay.
//!
//! One [`RelayClient`] maintains one logical bidirectional WebSocket
//! connection: it registers exactly once per physical socket, keeps the
//! link alive with periodic pings, re-establishes dropped connections
//! under a bounded fixed-delay retry policy, and delivers every inbound
//! chat message in one canonical shape regardless of which wire variant
//! the relay emitted (see `relaylink-proto`).
//!
//! Nothing here surfaces to the application as an error or a panic:
//! transport failures arrive through the connection-state callback,
//! undecodable frames are logged and dropped, and a rejected send is a
//! `false` return.
//!
//! ```no_run
//! use std::sync::Arc;
//! use relaylink::{ClientOptions, RelayClient, RelayConfig, StaticToken};
//!
//! # fn main() -> Result<(), relaylink::ConfigError> {
//! let config = RelayConfig::load("config.toml")?;
//! let client = RelayClient::new(
//!     &config,
//!     ClientOptions::new("u1")
//!         .on_message(|event| println!("{:?}", event))
//!         .on_connection_change(|up| println!("connected: {up}")),
//!     Arc::new(StaticToken("bearer-token".to_string())),
//! );
//!
//! client.connect();
//! client.send_message("u2", "hello", None);
//! // ... later, the only teardown path:
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod reconnect;
pub mod token;

pub use crate::client::{
    ClientOptions, ConnectionCallback, ConnectionState, MessageCallback, RelayClient,
};
pub use crate::config::{ConfigError, RelayConfig, RelayEndpoint, SessionTuning};
pub use crate::error::SendRejection;
pub use crate::reconnect::ReconnectPolicy;
pub use crate::token::{EnvToken, StaticToken, TokenStore};

// Re-export the canonical event model so applications depend on one crate.
pub use relaylink_proto::{AckMessage, InboundEvent, IncomingMessage, SenderProfile};
