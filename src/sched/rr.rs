//! Round-robin scheduler implementation.

use super::trait_def::Scheduler;
use crate::thread::{ThreadId, ThreadPool, ThreadState};

/// Round-robin over pool slots.
///
/// Starting at the slot after the running one, the scan wraps around the
/// pool and takes the first `Ready` slot it meets. Every ready thread is
/// therefore picked within `N` consecutive decisions. The running slot is
/// checked last, so a thread that is alone keeps the CPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    /// Create a new round-robin scheduler.
    pub const fn new() -> Self {
        Self
    }
}

impl Scheduler for RoundRobinScheduler {
    fn select_next<const N: usize>(&self, pool: &ThreadPool<N>) -> ThreadId {
        let running = pool.running();
        let start = running.index();
        (1..=N)
            .map(|offset| (start + offset) % N)
            .filter_map(ThreadId::from_index)
            .find(|&id| pool.state(id) == Some(ThreadState::Ready))
            .unwrap_or(running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() {}

    fn pool_with<const N: usize>(threads: usize) -> ThreadPool<N> {
        let mut pool = ThreadPool::new();
        pool.reset();
        for _ in 0..threads {
            pool.claim(body).unwrap();
        }
        pool
    }

    #[test]
    fn test_picks_slot_after_running() {
        let pool = pool_with::<4>(3);
        let sched = RoundRobinScheduler::new();
        assert_eq!(sched.select_next(&pool), ThreadId::new(1));
    }

    #[test]
    fn test_wraps_around() {
        let mut pool = pool_with::<4>(3);
        pool.plan_switch(ThreadId::new(3)).unwrap();
        let sched = RoundRobinScheduler::new();
        // Slot 0 was demoted to ready by the switch
        assert_eq!(sched.select_next(&pool), ThreadId::new(0));
    }

    #[test]
    fn test_skips_waiting_slots() {
        let mut pool = pool_with::<4>(3);
        pool.block(ThreadId::new(1)).unwrap();
        pool.block(ThreadId::new(2)).unwrap();
        let sched = RoundRobinScheduler::new();
        assert_eq!(sched.select_next(&pool), ThreadId::new(3));
    }

    #[test]
    fn test_keeps_running_thread_when_alone() {
        let mut pool = pool_with::<4>(1);
        pool.block(ThreadId::new(1)).unwrap();
        let sched = RoundRobinScheduler::new();
        assert_eq!(sched.select_next(&pool), ThreadId::new(0));

        // Even a sleeping running thread is returned; the kernel parks it
        pool.sleep_running(2);
        assert_eq!(sched.select_next(&pool), ThreadId::new(0));
    }

    #[test]
    fn test_every_ready_slot_is_visited() {
        let mut pool = pool_with::<5>(4);
        let sched = RoundRobinScheduler::new();
        let mut seen = [false; 5];
        for _ in 0..5 {
            let next = sched.select_next(&pool);
            seen[next.index()] = true;
            pool.plan_switch(next).unwrap();
        }
        assert!(seen.iter().all(|&s| s));
    }
}
