//! Tick-based vsync source for the terminal host.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use overlay::driver::Vsync;

/// Fixed-rate vsync facility driven by a tokio interval.
///
/// The host loop consumes registrations one at a time and delivers each
/// tick's deadline, in nanoseconds since scheduler creation, as the
/// presentation timestamp (an arbitrary, strictly increasing epoch).
/// Missed ticks are skipped rather than bursted, so dropped frames show up
/// as gaps between consecutive presentation timestamps.
pub struct TickVsync {
    interval: Interval,
    origin: Instant,
    registered: bool,
}

impl TickVsync {
    /// A vsync source firing at `refresh_hz` frames per second.
    #[must_use]
    pub fn new(refresh_hz: f64) -> Self {
        let period = Duration::from_secs_f64(1.0 / refresh_hz.max(1.0));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            origin: Instant::now(),
            registered: false,
        }
    }

    /// Consume a pending registration, if one exists.
    pub fn take_registration(&mut self) -> bool {
        std::mem::take(&mut self.registered)
    }

    /// Wait for the next tick and return its presentation timestamp.
    #[allow(clippy::cast_possible_truncation)] // u64 nanoseconds cover ~584 years
    pub async fn next_frame(&mut self) -> u64 {
        let deadline = self.interval.tick().await;
        deadline.duration_since(self.origin).as_nanos() as u64
    }
}

impl Vsync for TickVsync {
    fn register_next_frame(&mut self) {
        self.registered = true;
    }
}
