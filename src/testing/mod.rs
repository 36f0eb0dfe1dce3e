//! Deterministic fakes for driving arbiters without hardware.

pub mod mock_registers;
pub mod sim_link;
#[cfg(test)]
/// Unit tests for the fakes.
pub mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub use mock_registers::MockRegisters;
pub use sim_link::{SimBoard, SimLink, Side};

use crate::transport::{Clock, NonceSource};

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock frozen at the current instant
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move time forward for every clone
    #[allow(
        clippy::cast_possible_truncation,
        reason = "u64 nanoseconds cover centuries of test time"
    )]
    pub fn advance(&self, by: Duration) {
        self.offset_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Time elapsed since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }
}

/// Nonce source replaying a fixed script, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedNonces {
    script: Vec<u8>,
    index: usize,
}

impl ScriptedNonces {
    /// Replay `script` in order. An empty script always yields 0.
    pub fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            script: script.into_iter().collect(),
            index: 0,
        }
    }

    /// Number of nonces drawn so far
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.index
    }
}

impl NonceSource for ScriptedNonces {
    fn next_nonce(&mut self) -> u8 {
        if self.script.is_empty() {
            return 0;
        }
        let nonce = self.script[self.index % self.script.len()];
        self.index += 1;
        nonce
    }
}
