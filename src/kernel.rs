//! Kernel abstraction for managing the threading system.
//!
//! This module provides the main `Kernel` struct that ties the thread pool,
//! the scheduling policy, the stack region and the architecture layer
//! together. A board normally keeps one kernel in a `static`, calls
//! [`Kernel::init`] before enabling interrupts and forwards its timer
//! interrupt to [`Kernel::timer_interrupt`].

use crate::arch::{Arch, AtomicSection};
use crate::config::{self, KernelConfig};
use crate::console::ktrace;
use crate::errors::{KernelResult, ScheduleError, ScheduleResult, SpawnError};
use crate::mem::StackRegion;
use crate::sched::Scheduler;
use crate::thread::{EntryFn, Switch, ThreadId, ThreadPool, ThreadState};
use crate::time::{TickCounter, TickDivider, Ticks};
use core::cell::UnsafeCell;
use core::marker::PhantomData;
use portable_atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};

/// Global kernel reference for interrupt handlers.
static GLOBAL_KERNEL: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Event counters kept by a kernel.
pub struct KernelStats {
    context_switches: AtomicU32,
    threads_started: AtomicU32,
    threads_exited: AtomicU32,
    tick_calls: AtomicU32,
}

/// Point-in-time copy of [`KernelStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub context_switches: u32,
    pub threads_started: u32,
    pub threads_exited: u32,
    pub tick_calls: u32,
}

impl KernelStats {
    const fn new() -> Self {
        Self {
            context_switches: AtomicU32::new(0),
            threads_started: AtomicU32::new(0),
            threads_exited: AtomicU32::new(0),
            tick_calls: AtomicU32::new(0),
        }
    }

    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            context_switches: self.context_switches.load(Ordering::Relaxed),
            threads_started: self.threads_started.load(Ordering::Relaxed),
            threads_exited: self.threads_exited.load(Ordering::Relaxed),
            tick_calls: self.tick_calls.load(Ordering::Relaxed),
        }
    }
}

/// Main kernel handle that manages the threading system.
///
/// # Type Parameters
///
/// * `A` - Architecture implementation
/// * `S` - Scheduler implementation
/// * `N` - Number of thread slots, including the boot context in slot 0
pub struct Kernel<A: Arch, S: Scheduler, const N: usize> {
    scheduler: S,
    config: KernelConfig,
    stacks: StackRegion,
    pool: spin::Mutex<ThreadPool<N>>,
    /// Saved continuation of each slot; only touched by the switch itself
    contexts: [UnsafeCell<A::SavedContext>; N],
    initialized: AtomicBool,
    uptime: TickCounter,
    divider: TickDivider,
    stats: KernelStats,
    _arch: PhantomData<fn() -> A>,
}

impl<A: Arch, S: Scheduler, const N: usize> Kernel<A, S, N> {
    /// Create a new kernel instance.
    ///
    /// Nothing is checked here so the kernel can be built in a `static`;
    /// [`Kernel::init`] validates `config` and `stacks`.
    pub const fn new(scheduler: S, config: KernelConfig, stacks: StackRegion) -> Self {
        Self {
            scheduler,
            config,
            stacks,
            pool: spin::Mutex::new(ThreadPool::new()),
            contexts: [const { UnsafeCell::new(A::INITIAL_CONTEXT) }; N],
            initialized: AtomicBool::new(false),
            uptime: TickCounter::new(),
            divider: TickDivider::new(config.quantum_ticks),
            stats: KernelStats::new(),
            _arch: PhantomData,
        }
    }

    /// Initialize the kernel.
    ///
    /// Validates the configuration and the stack region, frees every slot
    /// and registers the caller as the running thread in slot 0. Must be
    /// called before the timer interrupt is enabled.
    pub fn init(&self) -> KernelResult<()> {
        config::validate_capacity(N)?;
        self.config.validate()?;
        self.stacks.validate(N, A::MIN_STACK_SIZE)?;

        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScheduleError::AlreadyInitialized.into());
        }

        self.with_pool(|pool| pool.reset());
        self.uptime.reset();
        self.divider.reset();
        ktrace!("[kernel] initialized with {} slots", N);
        Ok(())
    }

    /// Check if the kernel has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Get the timing configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get a reference to the scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Number of thread slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Run `f` on the pool with interrupts masked.
    fn with_pool<R>(&self, f: impl FnOnce(&mut ThreadPool<N>) -> R) -> R {
        let _section = AtomicSection::<A>::enter();
        let mut pool = self.pool.lock();
        f(&mut pool)
    }

    fn context_ptr(&self, id: ThreadId) -> Option<*mut A::SavedContext> {
        self.contexts.get(id.index()).map(UnsafeCell::get)
    }

    /// Start a thread running `entry` in the lowest free slot.
    ///
    /// The new thread is only made ready; the caller keeps the CPU until the
    /// next scheduling decision.
    pub fn start_thread(&'static self, entry: EntryFn) -> Result<ThreadId, SpawnError> {
        if !self.is_initialized() {
            return Err(SpawnError::NotInitialized);
        }

        let _section = AtomicSection::<A>::enter();
        let Some(id) = self.with_pool(|pool| pool.claim(entry)) else {
            crate::kprintln!("[kernel] thread pool exhausted ({} slots)", N);
            return Err(SpawnError::PoolExhausted);
        };

        let (Some(stack_top), Some(ctx)) = (self.stacks.slice_top(id.index()), self.context_ptr(id))
        else {
            self.with_pool(|pool| pool.release(id));
            return Err(SpawnError::NoStackSlice(id));
        };

        // SAFETY: the slot was free, so nothing runs on its context or its
        // stack slice, and `self` is 'static.
        unsafe {
            A::init_context(
                ctx,
                stack_top,
                thread_bootstrap::<A, S, N>,
                self as *const Self as usize,
            );
        }

        KernelStats::bump(&self.stats.threads_started);
        ktrace!("[kernel] started thread {}", id);
        Ok(id)
    }

    /// Identity of the running thread.
    pub fn running_thread(&self) -> ThreadId {
        self.with_pool(|pool| pool.running())
    }

    /// State of thread `id`, or `None` if it names no slot.
    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.with_pool(|pool| pool.state(id))
    }

    /// Get current thread statistics: `(live, runnable, waiting)`.
    pub fn thread_stats(&self) -> (usize, usize, usize) {
        self.with_pool(|pool| pool.counts())
    }

    /// Snapshot of the event counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Let the scheduler pick a thread and switch to it.
    ///
    /// Returns to the caller once the caller is scheduled again, or right
    /// away if no other thread is ready.
    pub fn run_next_thread(&self) {
        if !self.is_initialized() {
            return;
        }

        let _section = AtomicSection::<A>::enter();
        let planned = {
            let mut pool = self.pool.lock();
            let next = self.scheduler.select_next(&pool);
            pool.plan_switch(next)
        };

        match planned {
            Ok(Some(switch)) => self.switch(switch),
            Ok(None) => {}
            Err(error) => crate::kprintln!("[kernel] scheduler invariant violated: {}", error),
        }
    }

    /// Save the current continuation into `from` and resume `to`.
    ///
    /// Must be called inside an atomic section with the pool lock released.
    fn switch(&self, Switch { from, to }: Switch) {
        let (Some(prev), Some(next)) = (self.context_ptr(from), self.context_ptr(to)) else {
            return;
        };
        KernelStats::bump(&self.stats.context_switches);
        ktrace!("[kernel] switch {} -> {}", from, to);
        // SAFETY: both pointers come from `contexts`, `to` holds a
        // continuation from an earlier switch or `init_context`, and
        // interrupts are masked by the caller's section.
        unsafe { A::context_switch(prev, next) }
    }

    /// Wait until `me` is scheduled again after it gave up the CPU without
    /// another thread to switch to.
    fn park(&self, me: ThreadId) {
        while self.with_pool(|pool| pool.settle_parked(me)) {
            A::wait_for_interrupt();
        }
    }

    /// Put the running thread to sleep for at least `ticks` raw ticks.
    ///
    /// Does nothing before `init`, as no tick could ever wake the caller.
    pub fn thread_sleep(&self, ticks: Ticks) {
        if !self.is_initialized() {
            return;
        }

        let _section = AtomicSection::<A>::enter();
        let me = self.with_pool(|pool| pool.sleep_running(ticks));
        self.run_next_thread();
        self.park(me);
    }

    /// Put the running thread to sleep for at least `millis` milliseconds.
    pub fn sleep_ms(&self, millis: u32) {
        self.thread_sleep(self.config.millis_to_ticks(millis));
    }

    /// Block thread `id` until [`Kernel::resume_thread`] is called for it.
    ///
    /// Blocking the running thread switches away from it and only returns
    /// once it has been resumed and scheduled again.
    pub fn block_thread(&self, id: ThreadId) -> ScheduleResult<()> {
        if !self.is_initialized() {
            return Err(ScheduleError::NotInitialized);
        }

        let _section = AtomicSection::<A>::enter();
        let was_running = self.with_pool(|pool| pool.block(id))?;
        if was_running {
            self.run_next_thread();
            self.park(id);
        }
        Ok(())
    }

    /// Make a blocked or sleeping thread ready. Does not switch.
    pub fn resume_thread(&self, id: ThreadId) -> ScheduleResult<()> {
        self.with_pool(|pool| pool.resume(id))?;
        ktrace!("[kernel] resumed thread {}", id);
        Ok(())
    }

    /// Tick hook: count `elapsed` raw ticks off every sleeper, then let the
    /// scheduler preempt the running thread.
    pub fn tick(&self, elapsed: Ticks) {
        if !self.is_initialized() {
            return;
        }

        let _section = AtomicSection::<A>::enter();
        let woken = self.with_pool(|pool| pool.advance_sleepers(elapsed));
        self.uptime.advance(u64::from(elapsed));
        KernelStats::bump(&self.stats.tick_calls);
        if woken > 0 {
            ktrace!("[kernel] tick woke {} thread(s)", woken);
        }
        self.run_next_thread();
    }

    /// Raw timer interrupt entry.
    ///
    /// Calls [`Kernel::tick`] once every `quantum_ticks` interrupts with the
    /// number of raw ticks that passed.
    pub fn timer_interrupt(&self) {
        if !self.is_initialized() {
            return;
        }
        if let Some(elapsed) = self.divider.on_raw_tick() {
            self.tick(elapsed);
        }
    }

    /// Raw ticks accounted by the tick hook since `init`.
    pub fn system_ticks(&self) -> u64 {
        self.uptime.ticks()
    }

    /// Milliseconds accounted by the tick hook since `init`.
    pub fn uptime_ms(&self) -> u64 {
        self.config.tick_rate.ticks_to_millis(self.uptime.ticks())
    }

    /// Tear down the running thread and never return.
    ///
    /// The slot is freed at once and can be claimed again by
    /// `start_thread`. If nothing else is ready the dying thread idles until
    /// an interrupt makes something ready.
    pub fn exit_current(&self) -> ! {
        let _section = AtomicSection::<A>::enter();
        self.release_running();
        loop {
            self.hand_off();
            A::wait_for_interrupt();
        }
    }

    pub(crate) fn release_running(&self) -> ThreadId {
        let me = self.with_pool(|pool| pool.release_running());
        KernelStats::bump(&self.stats.threads_exited);
        ktrace!("[kernel] thread {} exited", me);
        me
    }

    /// Switch from a released running slot to the next ready one without
    /// keeping the outgoing continuation. Returns whether a switch happened.
    pub(crate) fn hand_off(&self) -> bool {
        let _section = AtomicSection::<A>::enter();
        let planned = {
            let mut pool = self.pool.lock();
            let next = self.scheduler.select_next(&pool);
            pool.plan_handoff(next)
        };

        let Some(Switch { from, to }) = planned else {
            return false;
        };
        let Some(next) = self.context_ptr(to) else {
            return false;
        };

        // The outgoing slot may already belong to a new thread whose fresh
        // context must not be overwritten.
        let mut scratch = A::INITIAL_CONTEXT;
        KernelStats::bump(&self.stats.context_switches);
        ktrace!("[kernel] hand off {} -> {}", from, to);
        // SAFETY: `next` comes from `contexts` and holds a valid continuation;
        // interrupts are masked by the section above.
        unsafe { A::context_switch(&mut scratch, next) };
        true
    }

    /// First code a new thread runs, on its own stack.
    fn enter_running(&self) -> ! {
        let entry = self.with_pool(|pool| pool.entry(pool.running()));
        // Ends the atomic section the scheduler switched in under
        A::enable_interrupts();
        if let Some(entry) = entry {
            entry();
        }
        self.exit_current()
    }

    /// Register this kernel as the global kernel for interrupt handlers.
    pub fn register_global(&'static self) {
        GLOBAL_KERNEL.store(self as *const Self as *mut (), Ordering::Release);
    }
}

extern "C" fn thread_bootstrap<A: Arch, S: Scheduler, const N: usize>(kernel: usize) -> ! {
    // SAFETY: `start_thread` passes the address of a 'static kernel of
    // exactly this type.
    let kernel = unsafe { &*(kernel as *const Kernel<A, S, N>) };
    kernel.enter_running()
}

// Safety: every access to the pool and the contexts happens with interrupts
// masked on a single core.
unsafe impl<A: Arch, S: Scheduler, const N: usize> Send for Kernel<A, S, N> {}
unsafe impl<A: Arch, S: Scheduler, const N: usize> Sync for Kernel<A, S, N> {}

/// Get the global kernel reference (for interrupt handlers).
///
/// Returns None if no kernel has been registered.
///
/// # Safety
///
/// `A`, `S` and `N` must be the parameters of the registered kernel.
pub unsafe fn get_global_kernel<A: Arch, S: Scheduler, const N: usize>(
) -> Option<&'static Kernel<A, S, N>> {
    let ptr = GLOBAL_KERNEL.load(Ordering::Acquire);
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { &*(ptr as *const Kernel<A, S, N>) })
    }
}
