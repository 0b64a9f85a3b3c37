//! Interrupt-masked critical sections.

use super::Arch;
use core::marker::PhantomData;

/// RAII guard that masks interrupts for its lifetime.
///
/// Entering records whether interrupts were enabled and disables them;
/// dropping re-enables them only if they were enabled on entry, so sections
/// nest freely. The guard lives on the stack of the thread that created it,
/// which means a thread switched out inside a section gets its own mask
/// state back when it is resumed and its guard drops.
#[must_use = "interrupts are restored as soon as the section is dropped"]
pub struct AtomicSection<A: Arch> {
    restore: bool,
    // Not Send: the mask belongs to the CPU context that entered
    _arch: PhantomData<*const A>,
}

impl<A: Arch> AtomicSection<A> {
    /// Mask interrupts until the returned guard is dropped.
    #[inline]
    pub fn enter() -> Self {
        let restore = A::interrupts_enabled();
        A::disable_interrupts();
        Self {
            restore,
            _arch: PhantomData,
        }
    }

    /// Whether interrupts will be re-enabled when this section ends.
    pub fn restores_interrupts(&self) -> bool {
        self.restore
    }
}

impl<A: Arch> Drop for AtomicSection<A> {
    #[inline]
    fn drop(&mut self) {
        if self.restore {
            A::enable_interrupts();
        }
    }
}

/// Run `f` with interrupts masked.
#[inline]
pub fn atomic<A: Arch, R>(f: impl FnOnce() -> R) -> R {
    let _section = AtomicSection::<A>::enter();
    f()
}
