//! Kernel configuration.
//!
//! Everything here is `const`-constructible so a kernel can live in a
//! `static` and be checked once at `init`.

use crate::errors::ConfigError;
use crate::thread::ThreadId;
use crate::time::{TickRate, Ticks, DEFAULT_QUANTUM_TICKS, DEFAULT_TICK_RATE_HZ};

/// Timing parameters of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Frequency of the raw timer interrupt feeding `timer_interrupt`
    pub tick_rate: TickRate,
    /// Raw ticks between two scheduling decisions
    pub quantum_ticks: u32,
}

impl KernelConfig {
    /// 1 kHz timer, scheduling every 50 raw ticks.
    pub const DEFAULT: KernelConfig = KernelConfig {
        tick_rate: TickRate::from_hz(DEFAULT_TICK_RATE_HZ),
        quantum_ticks: DEFAULT_QUANTUM_TICKS,
    };

    /// Configuration for a timer running at `tick_rate` with the default
    /// quantum.
    pub const fn new(tick_rate: TickRate) -> Self {
        Self {
            tick_rate,
            quantum_ticks: DEFAULT_QUANTUM_TICKS,
        }
    }

    /// Replace the quantum.
    pub const fn with_quantum(mut self, quantum_ticks: u32) -> Self {
        self.quantum_ticks = quantum_ticks;
        self
    }

    /// Length of one quantum in milliseconds.
    pub const fn quantum_millis(&self) -> u64 {
        self.tick_rate.ticks_to_millis(self.quantum_ticks as u64)
    }

    /// Convert a duration in milliseconds to raw ticks at this rate.
    pub const fn millis_to_ticks(&self, millis: u32) -> Ticks {
        self.tick_rate.millis_to_ticks(millis)
    }

    /// Check the timing parameters.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate.hz() == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.quantum_ticks == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        Ok(())
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Check that a pool of `slots` threads can be addressed by [`ThreadId`].
pub const fn validate_capacity(slots: usize) -> Result<(), ConfigError> {
    if slots == 0 {
        Err(ConfigError::EmptyPool)
    } else if slots >= ThreadId::MAX_SLOTS {
        Err(ConfigError::TooManySlots(slots))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KernelConfig::default();
        assert_eq!(config.tick_rate.hz(), 1000);
        assert_eq!(config.quantum_ticks, 50);
        assert_eq!(config.quantum_millis(), 50);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_invalid_config() {
        let config = KernelConfig::new(TickRate::from_hz(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickRate));

        let config = KernelConfig::DEFAULT.with_quantum(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroQuantum));
    }

    #[test]
    fn test_capacity_bounds() {
        assert_eq!(validate_capacity(0), Err(ConfigError::EmptyPool));
        assert_eq!(validate_capacity(5), Ok(()));
        assert_eq!(
            validate_capacity(ThreadId::MAX_SLOTS),
            Err(ConfigError::TooManySlots(ThreadId::MAX_SLOTS))
        );
    }

    #[test]
    fn test_millis_conversion_uses_rate() {
        let config = KernelConfig::new(TickRate::from_hz(100));
        assert_eq!(config.millis_to_ticks(1000), 100);
        assert_eq!(config.millis_to_ticks(15), 2);
    }
}
