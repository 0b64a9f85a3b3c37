//! Test helper utilities and common functionality.

use crate::arch::NoOpArch;
use crate::config::KernelConfig;
use crate::kernel::Kernel;
use crate::mem::StackArena;
use crate::sched::RoundRobinScheduler;
use crate::sync::Semaphore;
use crate::thread::{ThreadId, ThreadState};
use std::boxed::Box;
use std::vec::Vec;

/// Kernel type used by the crate-level tests.
pub(crate) type TestKernel<const N: usize> = Kernel<NoOpArch, RoundRobinScheduler, N>;

/// Semaphore matching [`TestKernel`].
pub(crate) type TestSemaphore<const N: usize> = Semaphore<N, NoOpArch>;

/// Thread body for slots whose code the test plays by hand.
pub(crate) fn idle_body() {}

/// Build and initialize a kernel with its own leaked stack arena.
pub(crate) fn boot<const N: usize>(config: KernelConfig) -> &'static TestKernel<N> {
    let arena: &'static StackArena<N, 128> = Box::leak(Box::new(StackArena::new()));
    let kernel: &'static TestKernel<N> = Box::leak(Box::new(Kernel::new(
        RoundRobinScheduler::new(),
        config,
        arena.region(),
    )));
    kernel.init().unwrap();
    kernel
}

/// Boot with the default configuration.
pub(crate) fn boot_default<const N: usize>() -> &'static TestKernel<N> {
    boot(KernelConfig::DEFAULT)
}

/// Start `count` idle threads and return their identities.
pub(crate) fn start_idle<const N: usize>(kernel: &'static TestKernel<N>, count: usize) -> Vec<ThreadId> {
    (0..count)
        .map(|_| kernel.start_thread(idle_body).unwrap())
        .collect()
}

/// Assert the state of `id`.
pub(crate) fn assert_state<const N: usize>(kernel: &TestKernel<N>, id: ThreadId, state: ThreadState) {
    assert_eq!(
        kernel.thread_state(id),
        Some(state),
        "thread {} expected {:?}",
        id,
        state
    );
}

/// Exactly one slot is running and it is the one in the running register.
pub(crate) fn assert_single_runner<const N: usize>(kernel: &TestKernel<N>) {
    let running = kernel.running_thread();
    let runners = (0..N)
        .filter_map(ThreadId::from_index)
        .filter(|&id| kernel.thread_state(id) == Some(ThreadState::Running))
        .count();
    assert!(runners <= 1, "{} slots marked running", runners);
    if runners == 1 {
        assert_state(kernel, running, ThreadState::Running);
    }
}

/// Simple linear congruential generator for property testing.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 16
    }

    /// Value in `min..max`.
    pub(crate) fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        min + (self.next_u64() % (max - min))
    }

    pub(crate) fn gen_bool(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }
}
