//! Architecture abstraction layer for context switching and interrupt masking.
//!
//! The scheduler never touches registers directly. Everything it needs from
//! the CPU goes through [`Arch`]: preparing a fresh continuation for a new
//! thread, swapping continuations, masking interrupts and idling until the
//! next interrupt.

pub mod section;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
pub mod aarch64;

pub use section::{atomic, AtomicSection};

/// Signature of the routine a fresh continuation starts in.
///
/// The argument is the value handed to [`Arch::init_context`].
pub type ThreadEntry = extern "C" fn(usize) -> !;

/// Architecture abstraction trait.
///
/// # Safety
///
/// Implementations involve direct hardware manipulation and inline assembly.
/// All methods marked as unsafe have specific preconditions that must be
/// upheld by the caller.
pub trait Arch {
    /// Saved execution state of a suspended thread.
    ///
    /// Holds whatever the architecture needs to resume a thread exactly where
    /// it called [`Arch::context_switch`] (callee-saved registers and the
    /// stack pointer on most targets).
    type SavedContext: Send;

    /// Context value for a slot that has never run.
    const INITIAL_CONTEXT: Self::SavedContext;

    /// Smallest stack slice, in bytes, a thread can start on.
    const MIN_STACK_SIZE: usize;

    /// Prepare `ctx` so that switching into it calls `entry(arg)` on the
    /// stack whose upper edge is `stack_top`.
    ///
    /// # Safety
    ///
    /// - `ctx` must point to a valid, properly aligned SavedContext that no
    ///   running thread is using
    /// - `stack_top` must be the 16-byte aligned upper edge of memory that is
    ///   reserved for this thread alone
    unsafe fn init_context(
        ctx: *mut Self::SavedContext,
        stack_top: *mut u8,
        entry: ThreadEntry,
        arg: usize,
    );

    /// Save the current continuation into `prev` and resume `next`.
    ///
    /// Returns only when some later switch resumes `prev`.
    ///
    /// # Safety
    ///
    /// - `prev` and `next` must point to valid, properly aligned contexts
    /// - `next` must hold a continuation produced by a previous switch or by
    ///   [`Arch::init_context`]
    /// - Must be called with interrupts disabled
    unsafe fn context_switch(prev: *mut Self::SavedContext, next: *const Self::SavedContext);

    /// Enable interrupts on the current CPU.
    fn enable_interrupts();

    /// Disable interrupts on the current CPU.
    fn disable_interrupts();

    /// Check if interrupts are currently enabled.
    fn interrupts_enabled() -> bool;

    /// Idle until an interrupt has been serviced.
    ///
    /// Interrupts are enabled for the duration of the wait; the mask state the
    /// caller had is restored before returning.
    fn wait_for_interrupt();
}

/// A no-op architecture implementation for host testing.
///
/// `context_switch` returns immediately, so after a switch the caller simply
/// carries on as whichever thread the scheduler now considers running. That
/// makes every scheduler transition observable from an ordinary unit test.
pub struct NoOpArch;

impl Arch for NoOpArch {
    type SavedContext = ();

    const INITIAL_CONTEXT: Self::SavedContext = ();

    const MIN_STACK_SIZE: usize = 0;

    unsafe fn init_context(
        _ctx: *mut Self::SavedContext,
        _stack_top: *mut u8,
        _entry: ThreadEntry,
        _arg: usize,
    ) {
    }

    unsafe fn context_switch(_prev: *mut Self::SavedContext, _next: *const Self::SavedContext) {}

    fn enable_interrupts() {}

    fn disable_interrupts() {}

    fn interrupts_enabled() -> bool {
        true
    }

    fn wait_for_interrupt() {
        core::hint::spin_loop();
    }
}

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
pub use aarch64::Aarch64Arch as DefaultArch;

// Hosted builds (unit tests, simulators) have no interrupt controller to mask
#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
pub use NoOpArch as DefaultArch;
