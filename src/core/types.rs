//! Core type definitions for μC/OS-III on the HW-RTOS
//!
//! These types provide strong typing for RTOS primitives.

/// Task priority (0 = highest priority)
pub type OsPrio = u8;

/// Tick counter type
pub type OsTick = u32;

/// Semaphore counter type
pub type OsSemCtr = u32;

/// Nesting counter
pub type OsNestingCtr = u8;

/// Option flags for API calls
pub type OsOpt = u16;

/// Object quantity type
pub type OsObjQty = u16;

/// Stack element type
pub type OsStkElement = u32;

/// Event flags type; the hardware groups are 16 bits wide
pub type OsFlags = u16;

/// Number of blocks in a memory partition
pub type OsMemQty = u32;

/// Size of one memory partition block, in bytes
pub type OsMemSize = usize;

/// Index of a hardware slot (context, semaphore, flag group, mailbox)
pub type OsSlotId = usize;

/// Hardware task context id
pub type OsCtxId = OsSlotId;

/// Kernel object type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
#[repr(u32)]
pub enum OsObjType {
    None = 0,
    Flag = 0x464C4147,    // 'FLAG'
    Mem = 0x4D454D20,     // 'MEM '
    Mutex = 0x4D555458,   // 'MUTX'
    Queue = 0x51554555,   // 'QUEU'
    Sem = 0x53454D41,     // 'SEMA'
    Task = 0x5441534B,    // 'TASK'
}

impl OsObjType {
    /// Decode a stored tag; unknown values read as `None`
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0x464C4147 => OsObjType::Flag,
            0x4D454D20 => OsObjType::Mem,
            0x4D555458 => OsObjType::Mutex,
            0x51554555 => OsObjType::Queue,
            0x53454D41 => OsObjType::Sem,
            0x5441534B => OsObjType::Task,
            _ => OsObjType::None,
        }
    }
}

/// Hardware context state, as reported by `CNTX_STAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
#[repr(u32)]
pub enum OsCtxState {
    /// Context slot holds no task
    Idle = 0x00,
    /// Task exists but is dormant
    Stop = 0x01,
    /// Task is blocked in the hardware
    Wait = 0x02,
    /// Task is ready to run
    Ready = 0x03,
    /// Task is running
    Run = 0x05,
}

impl OsCtxState {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x00 => Some(OsCtxState::Idle),
            0x01 => Some(OsCtxState::Stop),
            0x02 => Some(OsCtxState::Wait),
            0x03 => Some(OsCtxState::Ready),
            0x05 => Some(OsCtxState::Run),
            _ => None,
        }
    }
}

/// Action performed by a QINT slot when its interrupt fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
#[repr(u32)]
pub enum OsHwisrAction {
    SetFlag = 1,
    SigSem = 2,
    RelWai = 3,
    WupTsk = 4,
}

// ============ Option flags ============

/// API option flags
pub mod opt {
    use super::OsOpt;

    pub const NONE: OsOpt = 0x0000;

    // Delete options
    pub const DEL_NO_PEND: OsOpt = 0x0000;
    pub const DEL_ALWAYS: OsOpt = 0x0001;

    // Pend options
    pub const PEND_BLOCKING: OsOpt = 0x0000;
    pub const PEND_NON_BLOCKING: OsOpt = 0x8000;

    // Flag pend options
    pub const PEND_FLAG_CLR_ALL: OsOpt = 0x0001;
    pub const PEND_FLAG_CLR_ANY: OsOpt = 0x0002;
    pub const PEND_FLAG_SET_ALL: OsOpt = 0x0004;
    pub const PEND_FLAG_SET_ANY: OsOpt = 0x0008;
    pub const PEND_FLAG_CONSUME: OsOpt = 0x0100;

    // Post options
    pub const POST_NONE: OsOpt = 0x0000;
    pub const POST_FLAG_SET: OsOpt = 0x0000;
    pub const POST_FLAG_CLR: OsOpt = 0x0001;
    pub const POST_FIFO: OsOpt = 0x0000;
    pub const POST_LIFO: OsOpt = 0x0010;
    pub const POST_1: OsOpt = 0x0000;
    pub const POST_ALL: OsOpt = 0x0200;
    pub const POST_NO_SCHED: OsOpt = 0x8000;

    // Task options
    pub const TASK_NONE: OsOpt = 0x0000;
    pub const TASK_STK_CHK: OsOpt = 0x0001;
    pub const TASK_STK_CLR: OsOpt = 0x0002;
    pub const TASK_SAVE_FP: OsOpt = 0x0004;
    pub const TASK_NO_TLS: OsOpt = 0x0008;

    // Time options
    pub const TIME_DLY: OsOpt = 0x0000;
    pub const TIME_TIMEOUT: OsOpt = 0x0002;
    pub const TIME_MATCH: OsOpt = 0x0004;
    pub const TIME_PERIODIC: OsOpt = 0x0008;
    pub const TIME_HMSM_STRICT: OsOpt = 0x0000;
    pub const TIME_HMSM_NON_STRICT: OsOpt = 0x0010;
    pub const TIME_MASK: OsOpt = TIME_DLY | TIME_TIMEOUT | TIME_PERIODIC | TIME_MATCH;
    pub const TIME_OPTS_MASK: OsOpt = TIME_MASK | TIME_HMSM_NON_STRICT;

    // QINT options
    pub const QINT_ENABLED: OsOpt = 0x0000;
    pub const QINT_DISABLED: OsOpt = 0x0001;
}
