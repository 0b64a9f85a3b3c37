//! AArch64 (ARM64) architecture implementation.
//!
//! Threads run at EL1 on their own stack slice. A switch only has to keep
//! what the AAPCS64 says a callee preserves: x19-x28, the frame pointer,
//! the link register, the stack pointer and (with `full-fpu`) the low halves
//! of v8-v15. Everything else is already spilled by the compiler around the
//! call into the switch routine.

use super::{Arch, ThreadEntry};
use core::arch::{asm, global_asm};

pub struct Aarch64Arch;

/// Callee-saved register file of a suspended thread.
#[repr(C)]
#[derive(Debug)]
pub struct Aarch64Context {
    /// x19-x28, x29 (fp), x30 (lr)
    pub x: [u64; 12],
    pub sp: u64,
    /// d8-d15
    #[cfg(feature = "full-fpu")]
    pub d: [u64; 8],
}

unsafe impl Send for Aarch64Context {}
unsafe impl Sync for Aarch64Context {}

pub type SavedContext = Aarch64Context;

// Register slots used by `__pool_threads_start`
const ARG_SLOT: usize = 0; // x19
const ENTRY_SLOT: usize = 1; // x20
const FP_SLOT: usize = 10; // x29
const LR_SLOT: usize = 11; // x30

extern "C" {
    fn __pool_threads_switch(prev: *mut Aarch64Context, next: *const Aarch64Context);
    fn __pool_threads_start();
}

macro_rules! switch_routine {
    (save: [$($save:literal),*], load: [$($load:literal),*]) => {
        global_asm!(
            ".section .text.__pool_threads_switch, \"ax\", %progbits",
            ".global __pool_threads_switch",
            ".type __pool_threads_switch, %function",
            ".balign 4",
            "__pool_threads_switch:",
            "stp x19, x20, [x0, #0]",
            "stp x21, x22, [x0, #16]",
            "stp x23, x24, [x0, #32]",
            "stp x25, x26, [x0, #48]",
            "stp x27, x28, [x0, #64]",
            "stp x29, x30, [x0, #80]",
            "mov x9, sp",
            "str x9, [x0, #96]",
            $($save,)*
            $($load,)*
            "ldp x19, x20, [x1, #0]",
            "ldp x21, x22, [x1, #16]",
            "ldp x23, x24, [x1, #32]",
            "ldp x25, x26, [x1, #48]",
            "ldp x27, x28, [x1, #64]",
            "ldp x29, x30, [x1, #80]",
            "ldr x9, [x1, #96]",
            "mov sp, x9",
            "ret",
            ".size __pool_threads_switch, . - __pool_threads_switch",
            "",
            // First switch into a fresh slot returns here: x19 holds the
            // argument and x20 the entry routine, which never returns.
            ".section .text.__pool_threads_start, \"ax\", %progbits",
            ".global __pool_threads_start",
            ".type __pool_threads_start, %function",
            ".balign 4",
            "__pool_threads_start:",
            "mov x0, x19",
            "br x20",
            ".size __pool_threads_start, . - __pool_threads_start",
        );
    };
}

#[cfg(feature = "full-fpu")]
switch_routine!(
    save: [
        "stp d8, d9, [x0, #104]",
        "stp d10, d11, [x0, #120]",
        "stp d12, d13, [x0, #136]",
        "stp d14, d15, [x0, #152]"
    ],
    load: [
        "ldp d8, d9, [x1, #104]",
        "ldp d10, d11, [x1, #120]",
        "ldp d12, d13, [x1, #136]",
        "ldp d14, d15, [x1, #152]"
    ]
);

#[cfg(not(feature = "full-fpu"))]
switch_routine!(save: [], load: []);

impl Arch for Aarch64Arch {
    type SavedContext = Aarch64Context;

    const INITIAL_CONTEXT: Self::SavedContext = Aarch64Context {
        x: [0; 12],
        sp: 0,
        #[cfg(feature = "full-fpu")]
        d: [0; 8],
    };

    const MIN_STACK_SIZE: usize = 1024;

    unsafe fn init_context(
        ctx: *mut Self::SavedContext,
        stack_top: *mut u8,
        entry: ThreadEntry,
        arg: usize,
    ) {
        let start = __pool_threads_start as usize as u64;
        unsafe {
            ctx.write(Self::INITIAL_CONTEXT);
            let ctx = &mut *ctx;
            ctx.x[ARG_SLOT] = arg as u64;
            ctx.x[ENTRY_SLOT] = entry as usize as u64;
            ctx.x[FP_SLOT] = 0;
            ctx.x[LR_SLOT] = start;
            ctx.sp = stack_top as u64;
        }
    }

    unsafe fn context_switch(prev: *mut Self::SavedContext, next: *const Self::SavedContext) {
        unsafe { __pool_threads_switch(prev, next) }
    }

    // No `nomem` on the mask updates: they double as compiler fences for
    // the critical sections built on them.
    fn enable_interrupts() {
        unsafe {
            asm!("msr daifclr, #2", options(nostack));
        }
    }

    fn disable_interrupts() {
        unsafe {
            asm!("msr daifset, #2", options(nostack));
        }
    }

    fn interrupts_enabled() -> bool {
        let daif: u64;
        unsafe {
            asm!(
                "mrs {daif}, daif",
                daif = out(reg) daif,
                options(nostack, readonly)
            );
        }
        (daif & 0x80) == 0
    }

    fn wait_for_interrupt() {
        let was_enabled = Self::interrupts_enabled();
        // Pending IRQs are taken right after the unmask; wfi only sleeps if none is
        unsafe {
            asm!("msr daifclr, #2", "wfi", options(nostack));
        }
        if !was_enabled {
            Self::disable_interrupts();
        }
    }
}
