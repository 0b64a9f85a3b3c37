//! Property-based tests for verifying scheduler invariants.

#[cfg(test)]
mod property_tests {
    use crate::sched::{RoundRobinScheduler, Scheduler};
    use crate::tests::helpers::*;
    use crate::thread::{ThreadId, ThreadPool, ThreadState};
    use std::vec::Vec;

    const CAPACITY: usize = 8;

    fn fresh_pool() -> ThreadPool<CAPACITY> {
        let mut pool = ThreadPool::new();
        pool.reset();
        pool
    }

    #[test]
    fn property_claims_are_distinct_until_exhausted() {
        let mut rng = SimpleRng::new(0x12345678);
        let mut pool = fresh_pool();
        let mut live: Vec<ThreadId> = Vec::new();

        for _ in 0..500 {
            if live.is_empty() || rng.gen_bool() {
                let lowest_free = (1..CAPACITY)
                    .filter_map(ThreadId::from_index)
                    .find(|&id| pool.state(id) == Some(ThreadState::Invalid));
                let claimed = pool.claim(idle_body);

                // Property: the lowest free slot is handed out, and nothing
                // once every slot is taken
                assert_eq!(claimed, lowest_free);
                if let Some(id) = claimed {
                    assert!(!live.contains(&id));
                    live.push(id);
                }
            } else {
                let victim = live.swap_remove(rng.gen_range(0, live.len() as u64) as usize);
                pool.release(victim);
            }
            assert_eq!(pool.counts().0, live.len() + 1);
        }
    }

    #[test]
    fn property_sleepers_wake_exactly_when_due() {
        let mut rng = SimpleRng::new(0x87654321);

        for _ in 0..50 {
            let mut pool = fresh_pool();
            let mut durations = Vec::new();
            for _ in 1..CAPACITY {
                let id = pool.claim(idle_body).unwrap();
                pool.plan_switch(id).unwrap();
                let duration = rng.gen_range(1, 400) as u32;
                pool.sleep_running(duration);
                durations.push((id, duration));
            }

            let mut elapsed_total = 0u32;
            while elapsed_total < 400 {
                let elapsed = rng.gen_range(1, 60) as u32;
                let due_before = durations
                    .iter()
                    .filter(|&&(id, _)| pool.state(id) == Some(ThreadState::Sleeping))
                    .count();
                let woken = pool.advance_sleepers(elapsed);
                elapsed_total += elapsed;

                let still_sleeping = durations
                    .iter()
                    .filter(|&&(id, _)| pool.state(id) == Some(ThreadState::Sleeping))
                    .count();
                assert_eq!(woken, due_before - still_sleeping);

                // Property: ready exactly when the cumulative elapsed time
                // reaches the requested duration
                for &(id, duration) in &durations {
                    let tcb = pool.get(id).unwrap();
                    if elapsed_total >= duration {
                        assert_eq!(tcb.state(), ThreadState::Ready);
                        assert_eq!(tcb.sleep_remaining(), 0);
                    } else {
                        assert_eq!(tcb.state(), ThreadState::Sleeping);
                        assert_eq!(tcb.sleep_remaining(), duration - elapsed_total);
                    }
                }
            }
        }
    }

    #[test]
    fn property_round_robin_picks_next_ready_after_running() {
        let mut rng = SimpleRng::new(0xDEADBEEF);
        let scheduler = RoundRobinScheduler::new();

        for _ in 0..200 {
            let mut pool = fresh_pool();
            for _ in 1..CAPACITY {
                let id = pool.claim(idle_body).unwrap();
                if rng.gen_bool() {
                    pool.block(id).unwrap();
                }
            }
            let start = ThreadId::from_index(rng.gen_range(0, CAPACITY as u64) as usize).unwrap();
            if pool.state(start) == Some(ThreadState::Blocked) {
                pool.resume(start).unwrap();
            }
            pool.plan_switch(start).unwrap();

            let expected = (1..=CAPACITY)
                .map(|offset| ThreadId::from_index((start.index() + offset) % CAPACITY).unwrap())
                .find(|&id| pool.state(id) == Some(ThreadState::Ready))
                .unwrap_or(start);
            assert_eq!(scheduler.select_next(&pool), expected);
        }
    }

    #[test]
    fn property_every_ready_thread_runs_within_capacity_decisions() {
        let mut rng = SimpleRng::new(0xC0FFEE);
        let scheduler = RoundRobinScheduler::new();

        for _ in 0..50 {
            let mut pool = fresh_pool();
            let threads = rng.gen_range(1, CAPACITY as u64) as usize;
            for _ in 0..threads {
                pool.claim(idle_body).unwrap();
            }

            let mut ran = [false; CAPACITY];
            for _ in 0..CAPACITY {
                let next = scheduler.select_next(&pool);
                pool.plan_switch(next).unwrap();
                ran[pool.running().index()] = true;
            }
            assert!(ran[..=threads].iter().all(|&r| r));
            assert!(ran[threads + 1..].iter().all(|&r| !r));
        }
    }

    #[test]
    fn property_resume_is_idempotent() {
        let mut rng = SimpleRng::new(0xABCDEF);
        let mut pool = fresh_pool();
        let threads: Vec<ThreadId> = (1..CAPACITY).map(|_| pool.claim(idle_body).unwrap()).collect();

        for _ in 0..300 {
            let id = threads[rng.gen_range(0, threads.len() as u64) as usize];
            match rng.gen_range(0, 3) {
                0 => {
                    pool.block(id).unwrap();
                }
                _ => {
                    pool.resume(id).unwrap();
                    let before = pool.counts();
                    // Property: a second resume changes nothing
                    pool.resume(id).unwrap();
                    assert_eq!(pool.state(id), Some(ThreadState::Ready));
                    assert_eq!(pool.counts(), before);
                }
            }
        }
    }

    #[test]
    fn property_semaphore_counter_tracks_waiters() {
        let mut rng = SimpleRng::new(0x5EED);

        for _ in 0..30 {
            let kernel = boot_default::<6>();
            let sem = TestSemaphore::<6>::new();
            let waiters = rng.gen_range(1, 6) as usize;
            let threads = start_idle(kernel, waiters);

            kernel.run_next_thread();
            for &id in &threads {
                assert_eq!(kernel.running_thread(), id);
                sem.wait(kernel).unwrap();
                assert_eq!(sem.count(), -(sem.waiting() as i32));
            }

            let extra = rng.gen_range(0, 4) as usize;
            for i in 0..waiters + extra {
                sem.signal(kernel).unwrap();
                if i < waiters {
                    // FIFO: the i-th signal wakes the i-th waiter
                    assert_state(kernel, threads[i], ThreadState::Ready);
                    assert_eq!(sem.count(), -(sem.waiting() as i32));
                } else {
                    assert_eq!(sem.waiting(), 0);
                    assert_eq!(sem.count(), (i + 1 - waiters) as i32);
                }
            }
        }
    }
}
