//! Integration test common infrastructure.
//!
//! Provides an in-process fake relay server and configuration helpers for
//! exercising the client against real sockets.

pub mod relay;

#[allow(unused_imports)]
pub use relay::{RelayEvent, TestRelay};
