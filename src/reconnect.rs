//! Reconnection policy.
//!
//! Bounded retry with a fixed delay: no exponential backoff, no jitter.
//! The policy only decides; the attempt counter lives in the session record
//! and is incremented by the driver when a retry is actually scheduled. It
//! resets to zero on every successful open, never merely on an attempt, so
//! a long-lived healthy connection that later drops gets its full retry
//! budget back.

use std::time::Duration;

/// Decides whether, and after how long, to re-attempt connection after an
/// unexpected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Whether automatic reconnection is enabled at all.
    pub auto_reconnect: bool,
    /// Fixed delay before each attempt.
    pub delay: Duration,
    /// Maximum consecutive attempts before giving up.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before the next reconnection attempt, or `None` when no
    /// further attempt should be made.
    ///
    /// `attempts` is the number of retries already scheduled since the
    /// last successful open.
    pub fn next_delay(&self, attempts: u32) -> Option<Duration> {
        if !self.auto_reconnect {
            return None;
        }
        if attempts >= self.max_attempts {
            return None;
        }
        Some(self.delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            delay: Duration::from_millis(3000),
            max_attempts: 5,
        }
    }
}
