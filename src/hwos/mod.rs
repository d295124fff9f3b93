//! HW-RTOS hardware interface
//!
//! The hardware scheduler is reached through a block of memory-mapped
//! registers: per-context records, shadow tables for semaphores, flag groups
//! and mailboxes, the QINT binding table, and the CPU interface used to
//! submit system calls. Everything above this module talks to the hardware
//! through a [`HwosPort`] owned by the [`Kernel`](crate::Kernel).

pub mod engine;
pub mod opcode;
pub mod outcome;
pub mod reg;

pub use engine::{Command, Reply, Response, Transaction};
pub use opcode::Opcode;
pub use reg::Reg;

/// Access to the HW-RTOS register block.
///
/// The port is the single owner of the command interface. The kernel only
/// uses it with interrupts masked, so implementations need no locking.
pub trait HwosPort {
    /// Read a 32-bit register
    fn read(&self, reg: Reg) -> u32;

    /// Write a 32-bit register
    fn write(&self, reg: Reg, val: u32);

    /// Pend the dispatcher exception so the context switch requested by the
    /// hardware happens once interrupts are re-enabled.
    fn task_switch(&self);

    /// Barrier after leaving the critical section of a transaction, so a
    /// pended switch is taken before the caller reads its reply.
    fn task_sync(&self) {}
}

// ============ Response word ============

/// Result code field of `R0`
pub const RESP_CODE_MASK: u32 = 0x0000_FFFF;
/// Context id echoed with a switch request
pub const RESP_CTX_MASK: u32 = 0x00FF_0000;
pub const RESP_CTX_SHIFT: u32 = 16;
/// Set once the hardware has posted a response
pub const RESP_READY: u32 = 0x2000_0000;
/// The response asks for a context switch instead of replying to the caller
pub const RESP_CTX_REQ: u32 = 0x8000_0000;

// ============ Command arguments and shadow encodings ============

/// Written to `CMD` to start hardware scheduling
pub const CMD_START: u32 = 0x8004;

/// Set in `R4` of create commands
pub const ID_CREATE: u32 = 1 << 16;

/// Context record type of a task
pub const CNTX_TYPE_TASK: u32 = 0x03;

/// Sleep duration meaning "until woken"
pub const SLEEP_FOREVER: u32 = 0xFFFF_FFFF;

/// Hardware wait timeout meaning "forever"
pub const TIMEOUT_FOREVER: u32 = 0xFFFF_FFFF;

/// `SEM_TBL` entry is in use
pub const SEM_TBL_VALID: u32 = 1 << 18;
/// `SEM_TBL` entry counts (clear for a mutex)
pub const SEM_TBL_COUNTING: u32 = 1 << 11;
pub const SEM_TBL_MAX_SHIFT: u32 = 6;
pub const SEM_TBL_CNT_MASK: u32 = 0x3E;
pub const SEM_TBL_CNT_SHIFT: u32 = 1;

/// `FLG_TBL` keeps the 16 flag bits above a status bit
pub const FLG_TBL_SHIFT: u32 = 1;
pub const FLG_TBL_MASK: u32 = 0xFFFF;

/// `QINTSEL` enable bit above the interrupt number
pub const QINTSEL_EN: u32 = 0x80;

/// Number of `HWISR_PNTR` words
pub const HWISR_PNTR_CNT: usize = 8;
/// `HWISR_PNTR` identity map: byte i of word n selects QINT slot 4n + i
pub const HWISR_PNTR_BASE: u32 = 0x0302_0100;
pub const HWISR_PNTR_STEP: u32 = 0x0404_0404;

/// Semaphore shadow entry programmed before `CRE_SEM`
pub const fn sem_tbl_init(max: u32, counting: bool) -> u32 {
    SEM_TBL_VALID | if counting { SEM_TBL_COUNTING } else { 0 } | (max << SEM_TBL_MAX_SHIFT)
}

/// Current count held in a semaphore shadow entry
#[inline]
pub const fn sem_tbl_count(raw: u32) -> u32 {
    (raw & SEM_TBL_CNT_MASK) >> SEM_TBL_CNT_SHIFT
}

/// Flag bits held in a flag group shadow entry
#[inline]
pub const fn flg_tbl_flags(raw: u32) -> u16 {
    ((raw >> FLG_TBL_SHIFT) & FLG_TBL_MASK) as u16
}

/// Translate an API pend timeout to the hardware encoding.
///
/// `0` waits forever and becomes the all-ones sentinel; an explicit
/// all-ones is pulled back by one so it stays a finite wait. Non-blocking
/// pends always use a zero timeout.
#[inline]
pub const fn pend_timeout(timeout: u32, non_blocking: bool) -> u32 {
    if non_blocking {
        return 0;
    }
    match timeout {
        0 => TIMEOUT_FOREVER,
        TIMEOUT_FOREVER => TIMEOUT_FOREVER - 1,
        t => t,
    }
}
