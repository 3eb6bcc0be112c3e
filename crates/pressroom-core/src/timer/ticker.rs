//! Cancellable once-per-second tick schedule.
//!
//! Each `arm()` hands out a new token and invalidates every earlier one, so
//! a tick that was already in flight when the schedule was cancelled or
//! re-armed is recognised as stale and dropped.

use std::time::Duration;

/// Wall-clock period between ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one armed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

#[derive(Debug, Default)]
pub struct Ticker {
    generation: u64,
    armed: bool,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new schedule, replacing any current one.
    pub fn arm(&mut self) -> TickToken {
        self.generation += 1;
        self.armed = true;
        TickToken(self.generation)
    }

    /// Stop ticking. Returns whether anything was armed; safe to repeat.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    /// Token of the live schedule, if any.
    pub fn current(&self) -> Option<TickToken> {
        self.armed.then_some(TickToken(self.generation))
    }

    /// Whether a tick carrying `token` should be processed.
    pub fn accepts(&self, token: TickToken) -> bool {
        self.armed && token.0 == self.generation
    }
}
