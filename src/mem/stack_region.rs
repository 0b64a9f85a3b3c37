//! Stack region split into per-thread slices.

use crate::errors::ConfigError;
use core::cell::UnsafeCell;

/// Alignment of every initial stack pointer (AAPCS64 and most other ABIs).
pub const STACK_ALIGN: usize = 16;

/// A block of memory split into `slots` equal stack slices.
///
/// Slice `i` covers `[base + i * slice_size, base + (i + 1) * slice_size)`.
/// Stacks grow down, so a thread starts at the upper edge of its slice,
/// rounded down to [`STACK_ALIGN`].
#[derive(Debug, Clone, Copy)]
pub struct StackRegion {
    base: *mut u8,
    slice_size: usize,
    slots: usize,
}

// The region is only a description of memory; the kernel hands each slice
// to exactly one thread.
unsafe impl Send for StackRegion {}
unsafe impl Sync for StackRegion {}

impl StackRegion {
    /// Describe `slots * slice_size` bytes starting at `base`.
    ///
    /// # Safety
    ///
    /// The memory must be valid for reads and writes for the rest of the
    /// program and must not be used by anything other than the kernel this
    /// region is given to.
    pub const unsafe fn new(base: *mut u8, slice_size: usize, slots: usize) -> Self {
        Self {
            base,
            slice_size,
            slots,
        }
    }

    /// A region with no slices. Fails validation for any non-empty pool.
    pub const fn empty() -> Self {
        Self {
            base: core::ptr::null_mut(),
            slice_size: 0,
            slots: 0,
        }
    }

    /// Lowest address of the region.
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    /// Size of one slice in bytes.
    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    /// Number of slices.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Lowest address of slice `index`.
    pub fn slice_base(&self, index: usize) -> Option<*mut u8> {
        if index >= self.slots {
            return None;
        }
        Some(self.base.wrapping_add(index * self.slice_size))
    }

    /// Initial stack pointer for slice `index`: its upper edge aligned down
    /// to [`STACK_ALIGN`].
    pub fn slice_top(&self, index: usize) -> Option<*mut u8> {
        if index >= self.slots {
            return None;
        }
        let top = self.base.wrapping_add((index + 1) * self.slice_size);
        let misalign = top as usize & (STACK_ALIGN - 1);
        Some(top.wrapping_sub(misalign))
    }

    /// Check that the region can back `needed` threads with at least
    /// `minimum` bytes of stack each.
    pub fn validate(&self, needed: usize, minimum: usize) -> Result<(), ConfigError> {
        if self.slots < needed {
            return Err(ConfigError::StackRegionTooSmall {
                slots: self.slots,
                needed,
            });
        }
        if self.slice_size < minimum {
            return Err(ConfigError::StackSliceTooSmall {
                size: self.slice_size,
                minimum,
            });
        }
        if needed > 0 && (self.base as usize) % STACK_ALIGN != 0 {
            return Err(ConfigError::MisalignedStack(self.base as usize));
        }
        Ok(())
    }
}

/// Statically reserved backing memory for `N` stacks of `SIZE` bytes.
///
/// ```ignore
/// static STACKS: StackArena<5, 1024> = StackArena::new();
/// static KERNEL: Kernel<DefaultArch, RoundRobinScheduler, 5> =
///     Kernel::new(RoundRobinScheduler::new(), KernelConfig::DEFAULT, STACKS.region());
/// ```
#[repr(C, align(16))]
pub struct StackArena<const N: usize, const SIZE: usize> {
    memory: UnsafeCell<[[u8; SIZE]; N]>,
}

// Only reachable through the raw pointers of `region`, each slice owned by
// one thread.
unsafe impl<const N: usize, const SIZE: usize> Sync for StackArena<N, SIZE> {}

impl<const N: usize, const SIZE: usize> StackArena<N, SIZE> {
    /// Zeroed arena.
    pub const fn new() -> Self {
        Self {
            memory: UnsafeCell::new([[0; SIZE]; N]),
        }
    }

    /// Region covering the whole arena, one slice per stack.
    pub const fn region(&'static self) -> StackRegion {
        // SAFETY: the arena is 'static and only ever accessed through the
        // returned region
        unsafe { StackRegion::new(self.memory.get().cast(), SIZE, N) }
    }
}

impl<const N: usize, const SIZE: usize> Default for StackArena<N, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}
