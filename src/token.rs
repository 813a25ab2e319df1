//! Bearer-token access for relay authentication.
//!
//! The token itself is owned elsewhere (login flow, secret store); the
//! client only needs a synchronous read at connect time. When no token is
//! available the client fails closed: it logs a warning and does not open
//! a socket.

use std::sync::Arc;

/// Synchronous read access to the session's bearer token.
pub trait TokenStore: Send + Sync {
    /// The current bearer token, if one is available.
    fn bearer_token(&self) -> Option<String>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn bearer_token(&self) -> Option<String> {
        (**self).bearer_token()
    }
}

/// A fixed token supplied at construction.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenStore for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Reads the token from an environment variable on every call, so a
/// refreshed token is picked up by the next reconnection attempt.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Read the token from `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenStore for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}
