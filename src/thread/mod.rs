//! Thread identities, states and control blocks.

use crate::time::Ticks;

pub mod pool;

pub use pool::{Switch, ThreadPool};

/// Thread body. Expected to loop forever; returning tears the thread down.
pub type EntryFn = fn();

/// Identity of a thread, which is also the index of its pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u16);

impl core::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "<invalid>")
        }
    }
}

impl ThreadId {
    /// Sentinel meaning "no thread".
    pub const INVALID: ThreadId = ThreadId(u16::MAX);

    /// Largest number of slots a pool can have; one value is the sentinel.
    pub const MAX_SLOTS: usize = u16::MAX as usize;

    /// Create a thread ID from a raw slot number.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Identity of the slot at `index`, if it is representable.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::MAX_SLOTS {
            Some(Self(index as u16))
        } else {
            None
        }
    }

    /// Get the raw ID value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Pool slot index of this thread.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is anything other than [`ThreadId::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != u16::MAX
    }
}

/// Lifecycle state of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Free slot, available to `start_thread`
    Invalid = 0,
    /// Eligible to be picked by the scheduler
    Ready = 1,
    /// Currently executing; exactly one slot at a time
    Running = 2,
    /// Waiting for an explicit resume
    Blocked = 3,
    /// Waiting for its sleep countdown to elapse
    Sleeping = 4,
    /// Reserved. Teardown releases slots straight to `Invalid`, so no
    /// transition ever produces this state.
    Dead = 5,
}

impl ThreadState {
    /// Slot holds a thread (anything but `Invalid`/`Dead`).
    pub fn is_live(self) -> bool {
        !matches!(self, ThreadState::Invalid | ThreadState::Dead)
    }

    /// Ready or running.
    pub fn is_runnable(self) -> bool {
        matches!(self, ThreadState::Ready | ThreadState::Running)
    }

    /// Blocked or sleeping.
    pub fn is_waiting(self) -> bool {
        matches!(self, ThreadState::Blocked | ThreadState::Sleeping)
    }
}

/// Per-slot scheduling data.
///
/// The saved register context is kept next to the pool by the kernel rather
/// than in here, so this type stays free of architecture details.
#[derive(Debug, Clone, Copy)]
pub struct ThreadControlBlock {
    state: ThreadState,
    entry: Option<EntryFn>,
    sleep_remaining: Ticks,
}

impl ThreadControlBlock {
    /// A free slot.
    pub const EMPTY: ThreadControlBlock = ThreadControlBlock {
        state: ThreadState::Invalid,
        entry: None,
        sleep_remaining: 0,
    };

    /// Get the slot's current state.
    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Thread body stored by `start_thread`.
    pub fn entry(&self) -> Option<EntryFn> {
        self.entry
    }

    /// Ticks left before a sleeping thread becomes ready.
    pub fn sleep_remaining(&self) -> Ticks {
        self.sleep_remaining
    }
}
