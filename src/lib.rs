#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]

//! Preemptive threads for single-core bare-metal targets.
//!
//! A fixed pool of thread slots, each with its own slice of a statically
//! reserved stack region, scheduled round-robin from a periodic timer
//! interrupt. Threads can sleep for a number of ticks, be blocked and
//! resumed, and synchronise through counting semaphores. Nothing is
//! allocated at run time.
//!
//! # Target Platform
//!
//! - **Architecture**: AArch64 at EL1 (`aarch64-unknown-none`), or any
//!   target that supplies an [`Arch`] implementation
//! - **Environment**: Bare-metal, single core
//! - **Host builds** use [`NoOpArch`](arch::NoOpArch) so the scheduler can
//!   be unit tested
//!
//! # Features
//!
//! - `full-fpu`: Save and restore d8-d15 on context switches (default)
//! - `trace`: Log thread start, exit, switches and wake-ups to the console
//!
//! # Quick Start
//!
//! ```ignore
//! use pool_threads::{DefaultArch, Kernel, KernelConfig, RoundRobinScheduler, StackArena};
//!
//! static STACKS: StackArena<4, 1024> = StackArena::new();
//! static KERNEL: Kernel<DefaultArch, RoundRobinScheduler, 4> =
//!     Kernel::new(RoundRobinScheduler::new(), KernelConfig::DEFAULT, STACKS.region());
//!
//! fn blink() {
//!     loop {
//!         toggle_led();
//!         KERNEL.sleep_ms(500);
//!     }
//! }
//!
//! fn kernel_main() -> ! {
//!     KERNEL.init().expect("Failed to initialize kernel");
//!     KERNEL.register_global();
//!     KERNEL.start_thread(blink).expect("Failed to start thread");
//!     enable_timer_interrupt(); // calls KERNEL.timer_interrupt() at 1 kHz
//!
//!     loop {
//!         KERNEL.sleep_ms(1000);
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`thread::ThreadPool`] holds every scheduling state transition and
//!   knows nothing about registers
//! - [`Scheduler`] picks the next slot; [`RoundRobinScheduler`] is the default
//! - [`Arch`] prepares, saves and restores continuations and masks
//!   interrupts
//! - [`Kernel`] ties them together, masking interrupts around every change

// Core modules
pub mod arch;
pub mod config;
pub mod console;
pub mod errors;
pub mod kernel;
pub mod mem;
pub mod sched;
pub mod sync;
pub mod thread;
pub mod time;

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests;

// Panic handler for bare-metal
#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use arch::Arch;

    DefaultArch::disable_interrupts();
    crate::kprintln!("[panic] {}", info);
    loop {
        core::hint::spin_loop();
    }
}

// ============================================================================
// Public API
// ============================================================================

// Architecture abstraction
pub use arch::{Arch, AtomicSection, DefaultArch};

// Kernel
pub use kernel::{get_global_kernel, Kernel, StatsSnapshot};

// Configuration
pub use config::KernelConfig;

// Scheduler
pub use sched::{DefaultScheduler, RoundRobinScheduler, Scheduler};

// Threads
pub use thread::{EntryFn, ThreadId, ThreadState};

// Memory management
pub use mem::{StackArena, StackRegion};

// Synchronisation
pub use sync::Semaphore;

// Time
pub use time::{TickRate, Ticks};

// Errors
pub use errors::{
    ConfigError, KernelError, KernelResult, ScheduleError, ScheduleResult, SemaphoreError,
    SpawnError,
};
