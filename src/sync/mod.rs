//! Synchronisation primitives built on the scheduler.

pub mod semaphore;

pub use semaphore::Semaphore;

use crate::thread::ThreadId;

/// Bounded FIFO of threads waiting on a primitive of a pool with `N` slots.
pub type WaitQueue<const N: usize> = heapless::Deque<ThreadId, N>;
