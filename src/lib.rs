//! μC/OS-III API layer for the R-IN32M3 HW-RTOS
//!
//! The classic μC/OS-III programming model on top of a hardware scheduler:
//! - Tasks, semaphores, mutexes, event flags and message queues backed by
//!   fixed hardware slot tables
//! - A command protocol engine over the memory-mapped HW-RTOS CPU interface
//! - Timed delays driven by the hardware system timer
//! - Hardware interrupt (QINT) bindings that signal objects without software
//! - Fixed-size memory partitions

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod hwos;
pub mod sync;
#[cfg(feature = "hwisr")]
pub mod hwisr;
pub mod port;

// ============ Re-exports ============

pub use crate::core::config;
pub use crate::core::config::*;
pub use crate::core::critical;
pub use crate::core::error;
pub use crate::core::error::{OsError, OsResult};
pub use crate::core::kernel;
pub use crate::core::kernel::Kernel;
pub use crate::core::table;
pub use crate::core::types;
pub use crate::core::types::*;
pub use crate::core::task;
pub use crate::core::task::{OsTaskFn, OsTcb};
pub use crate::core::time;
#[cfg(feature = "mem")]
pub use crate::core::mem;

pub use hwos::{HwosPort, Reg};

#[cfg(feature = "sem")]
pub use sync::sem;
#[cfg(feature = "mutex")]
pub use sync::mutex;
#[cfg(feature = "flag")]
pub use sync::flag;
#[cfg(feature = "q")]
pub use sync::queue;

#[cfg(target_arch = "arm")]
pub use port::{os_cpu_init, os_start, OS};
