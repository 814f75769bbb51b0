//! Monotonic millisecond clock for the input poller.

use std::time::Instant;

/// Milliseconds since construction, truncated to `u32` (wraps after ~49 days).
/// Consumers compare timestamps with `wrapping_sub`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
