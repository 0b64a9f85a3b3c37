//! Error types for the kernel.
//!
//! Every fallible kernel operation reports one of the enums below. They are
//! plain `Copy` values so they can be returned from interrupt context and
//! compared in tests without allocation.

#![allow(clippy::uninlined_format_args)]

use crate::thread::{ThreadId, ThreadState};
use core::fmt;

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Result type for scheduler transitions.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Top-level error type covering every kernel subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Thread creation errors
    Spawn(SpawnError),
    /// Scheduling errors
    Schedule(ScheduleError),
    /// Semaphore errors
    Semaphore(SemaphoreError),
    /// Configuration errors
    Config(ConfigError),
}

/// Errors that can occur when starting a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// `Kernel::init` has not run yet
    NotInitialized,
    /// Every pool slot is in use
    PoolExhausted,
    /// The stack region has no slice for this slot
    NoStackSlice(ThreadId),
}

/// Errors related to scheduler transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// `Kernel::init` has not run yet
    NotInitialized,
    /// `Kernel::init` was called twice
    AlreadyInitialized,
    /// Identity does not name a pool slot
    InvalidThread(ThreadId),
    /// The slot is in a state that does not allow the transition
    InvalidState {
        /// Slot the transition was attempted on
        id: ThreadId,
        /// State the slot was found in
        state: ThreadState,
    },
}

/// Errors reported by semaphores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphoreError {
    /// The wait queue already holds one entry per pool slot
    QueueFull {
        /// Capacity of the wait queue
        capacity: usize,
    },
    /// The counter claimed a waiter but the queue was empty
    QueueEmpty,
    /// The scheduler rejected the block or resume
    Schedule(ScheduleError),
}

/// Errors found while validating the kernel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Tick rate of zero Hz
    ZeroTickRate,
    /// Quantum of zero raw ticks
    ZeroQuantum,
    /// Pool capacity of zero
    EmptyPool,
    /// Pool capacity that does not fit the identity type
    TooManySlots(usize),
    /// Stack region has fewer slices than the pool has slots
    StackRegionTooSmall {
        /// Slices available
        slots: usize,
        /// Slices required
        needed: usize,
    },
    /// Stack slices are smaller than the architecture needs
    StackSliceTooSmall {
        /// Configured slice size in bytes
        size: usize,
        /// Architecture minimum in bytes
        minimum: usize,
    },
    /// Stack region base is not 16-byte aligned
    MisalignedStack(usize),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Spawn(e) => write!(f, "Thread start error: {}", e),
            KernelError::Schedule(e) => write!(f, "Scheduling error: {}", e),
            KernelError::Semaphore(e) => write!(f, "Semaphore error: {}", e),
            KernelError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::NotInitialized => write!(f, "Kernel not initialized"),
            SpawnError::PoolExhausted => write!(f, "Thread pool exhausted"),
            SpawnError::NoStackSlice(id) => write!(f, "No stack slice for thread {}", id),
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::NotInitialized => write!(f, "Kernel not initialized"),
            ScheduleError::AlreadyInitialized => write!(f, "Kernel already initialized"),
            ScheduleError::InvalidThread(id) => write!(f, "Invalid thread ID: {}", id),
            ScheduleError::InvalidState { id, state } => {
                write!(f, "Thread {} is in unexpected state {:?}", id, state)
            }
        }
    }
}

impl fmt::Display for SemaphoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaphoreError::QueueFull { capacity } => {
                write!(f, "Semaphore wait queue full ({} entries)", capacity)
            }
            SemaphoreError::QueueEmpty => write!(f, "Semaphore wait queue unexpectedly empty"),
            SemaphoreError::Schedule(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTickRate => write!(f, "Tick rate must be non-zero"),
            ConfigError::ZeroQuantum => write!(f, "Quantum must be at least one tick"),
            ConfigError::EmptyPool => write!(f, "Thread pool must have at least one slot"),
            ConfigError::TooManySlots(n) => write!(f, "Thread pool of {} slots is too large", n),
            ConfigError::StackRegionTooSmall { slots, needed } => {
                write!(f, "Stack region has {} slices, {} needed", slots, needed)
            }
            ConfigError::StackSliceTooSmall { size, minimum } => {
                write!(f, "Stack slice of {} bytes is below the {} byte minimum", size, minimum)
            }
            ConfigError::MisalignedStack(addr) => {
                write!(f, "Stack region base {:#x} is not 16-byte aligned", addr)
            }
        }
    }
}

impl From<SpawnError> for KernelError {
    fn from(error: SpawnError) -> Self {
        KernelError::Spawn(error)
    }
}

impl From<ScheduleError> for KernelError {
    fn from(error: ScheduleError) -> Self {
        KernelError::Schedule(error)
    }
}

impl From<SemaphoreError> for KernelError {
    fn from(error: SemaphoreError) -> Self {
        KernelError::Semaphore(error)
    }
}

impl From<ConfigError> for KernelError {
    fn from(error: ConfigError) -> Self {
        KernelError::Config(error)
    }
}

impl From<ScheduleError> for SemaphoreError {
    fn from(error: ScheduleError) -> Self {
        SemaphoreError::Schedule(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_display_messages() {
        let err = KernelError::from(SpawnError::PoolExhausted);
        assert_eq!(err.to_string(), "Thread start error: Thread pool exhausted");

        let err = KernelError::from(ConfigError::MisalignedStack(0x1003));
        assert_eq!(
            err.to_string(),
            "Configuration error: Stack region base 0x1003 is not 16-byte aligned"
        );

        let err = KernelError::from(ScheduleError::NotInitialized);
        assert_eq!(err.to_string(), "Scheduling error: Kernel not initialized");
    }

    #[test]
    fn test_schedule_error_converts_into_semaphore_error() {
        let err: SemaphoreError = ScheduleError::InvalidThread(ThreadId::new(9)).into();
        assert_eq!(
            err,
            SemaphoreError::Schedule(ScheduleError::InvalidThread(ThreadId::new(9)))
        );
        assert_eq!(err.to_string(), "Invalid thread ID: 9");
    }
}
