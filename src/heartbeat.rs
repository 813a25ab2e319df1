//! Keep-alive heartbeat against relay idle timeouts.
//!
//! One ticker per physical connection, created after a successful open and
//! dropped with the session's event loop, so a closed connection can never
//! leak a ticking timer. Pings are best-effort: a failed send is logged
//! and the ticker keeps rescheduling, because link death is detected by
//! the transport's own error/close signal, never by missed pongs.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Recurring keep-alive ticker, active only while a connection is open.
#[derive(Debug)]
pub struct Heartbeat {
    timer: Interval,
}

impl Heartbeat {
    /// Create a ticker whose first tick fires one full `period` after the
    /// connection opened.
    pub fn new(period: Duration) -> Self {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { timer }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        self.timer.tick().await;
    }
}
