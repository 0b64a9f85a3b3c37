//! Memory for thread stacks.
//!
//! Stacks are carved out of one statically reserved region, one equal slice
//! per pool slot. Nothing is allocated at run time.

pub mod stack_region;

pub use stack_region::{StackArena, StackRegion};
