//! Port layer - CPU-specific implementations
//!
//! The stack image of a new task is plain data and builds everywhere; the
//! register access, dispatcher and interrupt wiring exist only for the
//! R-IN32M3 Cortex-M3 core.

pub mod stk;

#[cfg(target_arch = "arm")]
pub mod cortex_m3;

#[cfg(target_arch = "arm")]
pub use cortex_m3::{os_cpu_init, os_start, Rin32Hwos, OS};
