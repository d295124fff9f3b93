//! Compile-time configuration for μC/OS-III on the HW-RTOS
//!
//! Software tunables first, then the architectural limits of the
//! R-IN32M3 HW-RTOS. The latter are fixed by the silicon.

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Minimum task stack size, in stack elements
pub const CFG_STK_SIZE_MIN: usize = 64;

/// Idle task stack size, in stack elements
pub const CFG_IDLE_TASK_STK_SIZE: usize = 128;

/// Upper bound on polls of the response ready bit before the
/// transaction is declared lost
pub const CFG_RESP_SPIN_MAX: u32 = 100_000;

// ============ HW-RTOS architecture ============

/// Base address of the HW-RTOS register block
pub const HWOS_BASE: usize = 0x4008_0000;

/// Number of hardware task contexts
pub const HWOS_CNTX_CNT: usize = 64;

/// Number of hardware semaphores (shared by semaphores and mutexes)
pub const HWOS_SEM_CNT: usize = 128;

/// Largest count a hardware semaphore can hold
pub const HWOS_SEM_VAL_MAX: u32 = 31;

/// Number of hardware event flag groups
pub const HWOS_FLAG_CNT: usize = 64;

/// Number of hardware mailboxes
pub const HWOS_Q_CNT: usize = 64;

/// Number of priority levels; the lowest one is reserved for the idle task
pub const HWOS_MAX_PRIO: u8 = 15;

/// Context id meaning "no task is running yet"
pub const HWOS_CNTX_NONE: usize = HWOS_CNTX_CNT;

/// Number of QINT (hardware ISR) slots
pub const HWOS_HWISR_CNT: usize = 32;

/// Idle task priority
pub const CFG_PRIO_IDLE: u8 = HWOS_MAX_PRIO;
