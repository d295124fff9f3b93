//! Synchronization primitives
//!
//! Semaphores, mutexes, event flags and message queues. All of them are
//! thin handles over hardware slots; waiting and wake-up happen in the
//! HW-RTOS.

// Shared option tables and the slot helpers live in `sem`
#[cfg(any(feature = "sem", feature = "mutex", feature = "flag", feature = "q"))]
pub mod sem;

#[cfg(feature = "mutex")]
pub mod mutex;

#[cfg(feature = "flag")]
pub mod flag;

#[cfg(feature = "q")]
pub mod queue;
