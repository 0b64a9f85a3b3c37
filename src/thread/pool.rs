//! Fixed-capacity thread pool.
//!
//! `ThreadPool` is the scheduler's whole data model: `N` control blocks and
//! the running-slot register. All state transitions live here as plain
//! methods over `&mut self`, so the rules can be tested without an
//! interrupt controller or a real context switch. The kernel wraps every
//! call in an atomic section.

use super::{EntryFn, ThreadControlBlock, ThreadId, ThreadState};
use crate::errors::{ScheduleError, ScheduleResult};
use crate::time::Ticks;

/// A decided context switch: save `from`, resume `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub from: ThreadId,
    pub to: ThreadId,
}

/// `N` thread slots indexed by [`ThreadId`].
pub struct ThreadPool<const N: usize> {
    slots: [ThreadControlBlock; N],
    running: ThreadId,
}

impl<const N: usize> Default for ThreadPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ThreadPool<N> {
    /// A pool with every slot free. Call [`ThreadPool::reset`] before use.
    pub const fn new() -> Self {
        Self {
            slots: [ThreadControlBlock::EMPTY; N],
            running: ThreadId::new(0),
        }
    }

    /// Free every slot and make slot 0 the running thread.
    ///
    /// Slot 0 stands for whatever context called `init` (normally `main`).
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = ThreadControlBlock::EMPTY;
        }
        self.running = ThreadId::new(0);
        if let Some(boot) = self.slots.first_mut() {
            boot.state = ThreadState::Running;
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slot currently registered as running.
    pub fn running(&self) -> ThreadId {
        self.running
    }

    /// Control block of `id`, if it names a slot.
    pub fn get(&self, id: ThreadId) -> Option<&ThreadControlBlock> {
        self.slots.get(id.index())
    }

    fn get_mut(&mut self, id: ThreadId) -> ScheduleResult<&mut ThreadControlBlock> {
        self.slots
            .get_mut(id.index())
            .ok_or(ScheduleError::InvalidThread(id))
    }

    /// State of `id`, if it names a slot.
    pub fn state(&self, id: ThreadId) -> Option<ThreadState> {
        self.get(id).map(ThreadControlBlock::state)
    }

    /// Entry function stored for `id`.
    pub fn entry(&self, id: ThreadId) -> Option<EntryFn> {
        self.get(id).and_then(ThreadControlBlock::entry)
    }

    /// Iterate over every slot with its identity.
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, &ThreadControlBlock)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, tcb)| ThreadId::from_index(i).map(|id| (id, tcb)))
    }

    /// Claim the lowest free slot for `entry` and mark it ready.
    ///
    /// Returns `None` when every slot is taken.
    pub fn claim(&mut self, entry: EntryFn) -> Option<ThreadId> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.state == ThreadState::Invalid)?;
        let id = ThreadId::from_index(index)?;
        self.slots[index] = ThreadControlBlock {
            state: ThreadState::Ready,
            entry: Some(entry),
            sleep_remaining: 0,
        };
        Some(id)
    }

    /// Return `id` to the free list.
    pub fn release(&mut self, id: ThreadId) {
        if let Ok(slot) = self.get_mut(id) {
            *slot = ThreadControlBlock::EMPTY;
        }
    }

    /// Free the running slot (thread teardown). The running register keeps
    /// pointing at it until the next switch.
    pub fn release_running(&mut self) -> ThreadId {
        let id = self.running;
        self.release(id);
        id
    }

    /// Put the running thread to sleep for `ticks`.
    pub fn sleep_running(&mut self, ticks: Ticks) -> ThreadId {
        let id = self.running;
        if let Ok(slot) = self.get_mut(id) {
            slot.sleep_remaining = ticks;
            slot.state = ThreadState::Sleeping;
        }
        id
    }

    /// Mark `id` blocked. Returns whether it is the running thread, in which
    /// case the caller has to schedule away from it.
    pub fn block(&mut self, id: ThreadId) -> ScheduleResult<bool> {
        let running = self.running;
        let slot = self.get_mut(id)?;
        if !slot.state.is_live() {
            return Err(ScheduleError::InvalidState {
                id,
                state: slot.state,
            });
        }
        slot.state = ThreadState::Blocked;
        Ok(id == running)
    }

    /// Make a blocked or sleeping thread eligible again.
    ///
    /// Resuming a thread that is already ready changes nothing. The running
    /// thread and free slots cannot be resumed.
    pub fn resume(&mut self, id: ThreadId) -> ScheduleResult<()> {
        let slot = self.get_mut(id)?;
        match slot.state {
            ThreadState::Blocked | ThreadState::Sleeping => {
                slot.state = ThreadState::Ready;
                slot.sleep_remaining = 0;
                Ok(())
            }
            ThreadState::Ready => Ok(()),
            state => Err(ScheduleError::InvalidState { id, state }),
        }
    }

    /// Count `elapsed` ticks off every sleeping thread, waking those whose
    /// countdown runs out. Returns how many woke.
    pub fn advance_sleepers(&mut self, elapsed: Ticks) -> usize {
        let mut woken = 0;
        for slot in self.slots.iter_mut() {
            if slot.state != ThreadState::Sleeping {
                continue;
            }
            if slot.sleep_remaining > elapsed {
                slot.sleep_remaining -= elapsed;
            } else {
                slot.sleep_remaining = 0;
                slot.state = ThreadState::Ready;
                woken += 1;
            }
        }
        woken
    }

    /// Apply the state changes for switching to `next`, the scheduler's pick.
    ///
    /// Returns `Ok(None)` when `next` is already the running slot. Otherwise
    /// `next` must be ready: the running thread is demoted to ready if it
    /// was still running, and `next` becomes the running thread.
    pub fn plan_switch(&mut self, next: ThreadId) -> ScheduleResult<Option<Switch>> {
        let current = self.running;
        if next == current {
            return Ok(None);
        }
        let state = self.state(next).ok_or(ScheduleError::InvalidThread(next))?;
        match state {
            ThreadState::Running => Ok(None),
            ThreadState::Ready => {
                if let Ok(slot) = self.get_mut(current) {
                    if slot.state == ThreadState::Running {
                        slot.state = ThreadState::Ready;
                    }
                }
                self.make_running(next);
                Ok(Some(Switch {
                    from: current,
                    to: next,
                }))
            }
            state => Err(ScheduleError::InvalidState { id: next, state }),
        }
    }

    /// Like [`plan_switch`](Self::plan_switch) for a running slot that has
    /// been released: `next` may be that same slot if it was claimed again,
    /// and nothing is demoted.
    pub fn plan_handoff(&mut self, next: ThreadId) -> Option<Switch> {
        if self.state(next) != Some(ThreadState::Ready) {
            return None;
        }
        let from = self.running;
        self.make_running(next);
        Some(Switch { from, to: next })
    }

    /// Check whether `me` still has to wait after it tried to switch away.
    ///
    /// When no other thread was ready the scheduler leaves a sleeping or
    /// blocked caller on the CPU. It waits until a tick or a resume makes it
    /// ready, at which point it is marked running again.
    pub fn settle_parked(&mut self, me: ThreadId) -> bool {
        if self.running != me {
            return false;
        }
        match self.state(me) {
            Some(ThreadState::Sleeping | ThreadState::Blocked) => true,
            Some(ThreadState::Ready) => {
                self.make_running(me);
                false
            }
            _ => false,
        }
    }

    fn make_running(&mut self, id: ThreadId) {
        self.running = id;
        if let Ok(slot) = self.get_mut(id) {
            slot.state = ThreadState::Running;
        }
    }

    /// `(live, runnable, waiting)` thread counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.slots.iter().fold((0, 0, 0), |(live, runnable, waiting), slot| {
            (
                live + slot.state.is_live() as usize,
                runnable + slot.state.is_runnable() as usize,
                waiting + slot.state.is_waiting() as usize,
            )
        })
    }
}
