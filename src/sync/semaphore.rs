//! Counting semaphore with a FIFO wait queue.

use super::WaitQueue;
use crate::arch::{Arch, AtomicSection, DefaultArch};
use crate::errors::{ScheduleError, SemaphoreError};
use crate::kernel::Kernel;
use crate::sched::Scheduler;
use core::marker::PhantomData;

struct SemaphoreState<const N: usize> {
    /// Available units when non-negative, number of waiters when negative
    counter: i32,
    waiters: WaitQueue<N>,
}

/// Counting semaphore for the threads of a kernel with `N` slots.
///
/// `wait` takes a unit or blocks the caller; `signal` returns a unit or
/// wakes the longest waiting thread. Waiters are resumed strictly in the
/// order they blocked. A signal never switches by itself: the woken thread
/// runs at the next scheduling decision.
///
/// ```ignore
/// static DATA_READY: Semaphore<5> = Semaphore::new();
///
/// fn consumer() {
///     loop {
///         DATA_READY.wait(&KERNEL).ok();
///         // ...
///     }
/// }
/// ```
pub struct Semaphore<const N: usize, A: Arch = DefaultArch> {
    state: spin::Mutex<SemaphoreState<N>>,
    _arch: PhantomData<fn() -> A>,
}

impl<const N: usize, A: Arch> Semaphore<N, A> {
    /// Semaphore with no units and no waiters.
    pub const fn new() -> Self {
        Self::with_count(0)
    }

    /// Semaphore holding `count` units. Counts above `i32::MAX` are clamped.
    pub const fn with_count(count: u32) -> Self {
        let counter = if count > i32::MAX as u32 {
            i32::MAX
        } else {
            count as i32
        };
        Self {
            state: spin::Mutex::new(SemaphoreState {
                counter,
                waiters: WaitQueue::new(),
            }),
            _arch: PhantomData,
        }
    }

    /// Reset to no units and no waiters.
    ///
    /// Threads still queued are forgotten, not resumed.
    pub fn init(&self) {
        let _section = AtomicSection::<A>::enter();
        let mut state = self.state.lock();
        state.counter = 0;
        state.waiters.clear();
    }

    /// Current counter value. Negative values count the waiters.
    pub fn count(&self) -> i32 {
        let _section = AtomicSection::<A>::enter();
        self.state.lock().counter
    }

    /// Number of threads blocked on this semaphore.
    pub fn waiting(&self) -> usize {
        let _section = AtomicSection::<A>::enter();
        self.state.lock().waiters.len()
    }

    /// Take one unit, blocking the running thread until one is available.
    ///
    /// Fails without touching the counter if `kernel` is not initialized.
    pub fn wait<S: Scheduler>(&self, kernel: &Kernel<A, S, N>) -> Result<(), SemaphoreError> {
        if !kernel.is_initialized() {
            return Err(ScheduleError::NotInitialized.into());
        }

        let _section = AtomicSection::<A>::enter();
        let me = kernel.running_thread();
        {
            let mut state = self.state.lock();
            state.counter -= 1;
            if state.counter >= 0 {
                return Ok(());
            }
            if state.waiters.push_back(me).is_err() {
                state.counter += 1;
                drop(state);
                crate::kprintln!("[sem] wait queue full, thread {} not blocked", me);
                return Err(SemaphoreError::QueueFull { capacity: N });
            }
        }

        // Blocks until a signal resumes us; the lock is not held meanwhile
        if let Err(error) = kernel.block_thread(me) {
            let mut state = self.state.lock();
            state.waiters.pop_back();
            state.counter += 1;
            return Err(error.into());
        }
        Ok(())
    }

    /// Return one unit, resuming the longest waiting thread if there is one.
    pub fn signal<S: Scheduler>(&self, kernel: &Kernel<A, S, N>) -> Result<(), SemaphoreError> {
        let _section = AtomicSection::<A>::enter();
        let head = {
            let mut state = self.state.lock();
            state.counter = state.counter.saturating_add(1);
            if state.counter > 0 {
                return Ok(());
            }
            match state.waiters.pop_front() {
                Some(id) => id,
                None => {
                    state.counter -= 1;
                    return Err(SemaphoreError::QueueEmpty);
                }
            }
        };
        kernel.resume_thread(head)?;
        Ok(())
    }
}

impl<const N: usize, A: Arch> Default for Semaphore<N, A> {
    fn default() -> Self {
        Self::new()
    }
}
