//! Crate-level tests driving whole kernels on the host.
//!
//! Everything runs on [`NoOpArch`](crate::arch::NoOpArch): a context switch
//! returns at once and the test simply carries on as whichever thread the
//! kernel now considers running.

mod helpers;
mod property;
