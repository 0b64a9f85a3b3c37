//! Tick accounting and tick/millisecond conversion.
//!
//! Time is counted in raw timer interrupts. Sleeps and uptime are both
//! expressed in these units; [`TickDivider`] only decides how many of them
//! pass between two scheduling decisions.

pub mod tick;

pub use tick::{TickCounter, TickDivider};

/// Raw timer ticks.
pub type Ticks = u32;

/// Raw timer interrupt rate assumed by [`KernelConfig::DEFAULT`](crate::KernelConfig::DEFAULT).
pub const DEFAULT_TICK_RATE_HZ: u32 = 1000;

/// Raw timer interrupts between two calls of the tick hook.
pub const DEFAULT_QUANTUM_TICKS: u32 = 50;

/// Frequency of the raw timer interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(u32);

impl TickRate {
    /// Create a tick rate of `hz` raw interrupts per second.
    pub const fn from_hz(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the rate in Hz.
    pub const fn hz(self) -> u32 {
        self.0
    }

    /// Number of raw ticks covering at least `millis` milliseconds.
    ///
    /// Rounds up so a sleep never ends early. A zero rate converts
    /// everything to zero.
    pub const fn millis_to_ticks(self, millis: u32) -> Ticks {
        if self.0 == 0 {
            return 0;
        }
        let ticks = (millis as u64 * self.0 as u64).div_ceil(1000);
        if ticks > Ticks::MAX as u64 {
            Ticks::MAX
        } else {
            ticks as Ticks
        }
    }

    /// Milliseconds spanned by `ticks` raw ticks, rounded down.
    pub const fn ticks_to_millis(self, ticks: u64) -> u64 {
        if self.0 == 0 {
            return 0;
        }
        ticks * 1000 / self.0 as u64
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::from_hz(DEFAULT_TICK_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_up() {
        let rate = TickRate::from_hz(1000);
        assert_eq!(rate.millis_to_ticks(0), 0);
        assert_eq!(rate.millis_to_ticks(7), 7);

        let slow = TickRate::from_hz(32);
        // 10ms at 32Hz is 0.32 ticks
        assert_eq!(slow.millis_to_ticks(10), 1);
        assert_eq!(slow.millis_to_ticks(1000), 32);
    }

    #[test]
    fn test_millis_saturate() {
        let rate = TickRate::from_hz(u32::MAX);
        assert_eq!(rate.millis_to_ticks(u32::MAX), Ticks::MAX);
    }

    #[test]
    fn test_zero_rate() {
        let rate = TickRate::from_hz(0);
        assert_eq!(rate.millis_to_ticks(500), 0);
        assert_eq!(rate.ticks_to_millis(500), 0);
    }

    #[test]
    fn test_ticks_to_millis() {
        let rate = TickRate::default();
        assert_eq!(rate.hz(), DEFAULT_TICK_RATE_HZ);
        assert_eq!(rate.ticks_to_millis(2500), 2500);
        assert_eq!(TickRate::from_hz(100).ticks_to_millis(3), 30);
    }
}
