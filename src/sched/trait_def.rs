//! Scheduler trait definition.

use crate::thread::{ThreadId, ThreadPool};

/// Scheduling policy.
///
/// A policy only decides; it never mutates the pool. The kernel applies the
/// decision through [`ThreadPool::plan_switch`], always with interrupts
/// masked, so implementations may assume the pool does not change while
/// they look at it.
pub trait Scheduler: Send + Sync {
    /// Pick the slot that should run next.
    ///
    /// Must return a `Ready` slot, or the currently running slot when no
    /// other slot is ready.
    fn select_next<const N: usize>(&self, pool: &ThreadPool<N>) -> ThreadId;
}
