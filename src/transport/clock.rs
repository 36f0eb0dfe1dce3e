//! Monotonic time source

use std::time::Instant;

/// Provides the current instant for time-slice bookkeeping
pub trait Clock: Send {
    /// Current monotonic time
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
