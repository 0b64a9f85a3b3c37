//! Tick counting and quantum division.

use super::Ticks;
use portable_atomic::{AtomicU32, AtomicU64, Ordering};

/// Monotonic tick counter for system uptime.
///
/// Incremented from the timer interrupt and readable from any context.
pub struct TickCounter {
    ticks: AtomicU64,
}

impl TickCounter {
    /// Create a counter starting at zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// Add `ticks` to the counter.
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Get the current tick count.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub(crate) fn reset(&self) {
        self.ticks.store(0, Ordering::Release);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Divides raw timer interrupts down to scheduler ticks.
///
/// Every `interval` calls to [`on_raw_tick`](Self::on_raw_tick) one of them
/// reports a quantum boundary. Sleep countdowns stay in raw ticks; only the
/// frequency of scheduling decisions is divided.
pub struct TickDivider {
    interval: u32,
    count: AtomicU32,
}

impl TickDivider {
    /// Fire once every `interval` raw ticks. An interval of zero behaves
    /// like one.
    pub const fn new(interval: u32) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            count: AtomicU32::new(0),
        }
    }

    /// Raw ticks per quantum.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Raw ticks counted since the last quantum boundary.
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Count one raw tick.
    ///
    /// Returns the raw ticks accumulated over the quantum when this tick
    /// completes one, `None` otherwise.
    pub fn on_raw_tick(&self) -> Option<Ticks> {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        if count >= self.interval {
            self.count.store(0, Ordering::Release);
            Some(count)
        } else {
            None
        }
    }

    pub(crate) fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }
}
