//! Error types for μC/OS-III on the HW-RTOS
//!
//! Uses Rust's Result pattern instead of C-style error pointers. The numeric
//! values are the μC/OS-III `OS_ERR_*` codes, with the HW-RTOS specific block
//! starting at 70000.
//!
//! Two tiers are kept apart: everything in [`OsError`] is a recoverable
//! condition the caller handles, while a hardware response the kernel does
//! not expect at a call site goes through [`fatal`] and never returns.

/// RTOS error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
#[repr(u32)]
pub enum OsError {
    /// No error
    None = 0,

    // ============ ISR errors ============
    /// Cannot create object from ISR
    CreateIsr = 12001,
    /// Cannot delete object from ISR
    DelIsr = 13001,

    // ============ Memory errors ============
    /// Cannot create a memory partition from ISR
    MemCreateIsr = 22201,
    /// Every block is already back in the partition
    MemFull = 22202,
    /// Invalid (null or misaligned) partition storage
    MemInvalidPAddr = 22203,
    /// Partition must hold at least two blocks
    MemInvalidBlks = 22204,
    /// Block does not belong to the partition
    MemInvalidPBlk = 22206,
    /// Partition was never created
    MemInvalidPMem = 22207,
    /// Block size too small or not pointer aligned
    MemInvalidSize = 22209,
    /// No free blocks
    MemNoFreeBlks = 22210,

    // ============ Mutex errors ============
    /// Caller is not the mutex owner
    MutexNotOwner = 22401,

    // ============ Object errors ============
    /// Object already created
    ObjCreated = 24001,
    /// Object was deleted
    ObjDel = 24002,
    /// Null pointer for object
    ObjPtrNull = 24003,
    /// Wrong object type
    ObjType = 24004,

    // ============ Option errors ============
    /// Invalid option specified
    OptInvalid = 24101,

    // ============ OS state errors ============
    /// OS is not running
    OsNotRunning = 24201,
    /// OS is already running
    OsRunning = 24202,
    /// OS not initialized
    OsNotInit = 24203,

    // ============ Pend errors ============
    /// Pend was aborted
    PendAbort = 25001,
    /// Cannot pend from ISR
    PendIsr = 25006,
    /// Pend would block (non-blocking mode)
    PendWouldBlock = 25008,

    // ============ Priority errors ============
    /// Invalid priority
    PrioInvalid = 25203,

    // ============ Queue errors ============
    /// Queue is full
    QFull = 26001,
    /// Invalid queue size
    QSize = 26004,

    // ============ Semaphore errors ============
    /// Semaphore overflow
    SemOvf = 28101,

    // ============ State errors ============
    /// Invalid state
    StateInvalid = 28205,
    /// Invalid stack pointer
    StkInvalid = 28207,
    /// Invalid stack size
    StkSizeInvalid = 28208,

    // ============ Task errors ============
    /// Cannot change priority from ISR
    TaskChangePrioIsr = 29001,
    /// Cannot create task from ISR
    TaskCreateIsr = 29002,
    /// Cannot delete idle task
    TaskDelIdle = 29004,
    /// Cannot delete task from ISR
    TaskDelIsr = 29006,
    /// Invalid task
    TaskInvalid = 29007,
    /// Task is not delayed
    TaskNotDly = 29009,
    /// Task is not suspended
    TaskNotSuspended = 29011,
    /// Invalid task option
    TaskOpt = 29012,
    /// Cannot resume task from ISR
    TaskResumeIsr = 29013,
    /// A task cannot resume itself
    TaskResumeSelf = 29015,
    /// Cannot suspend task from ISR
    TaskSuspendIsr = 29021,

    // ============ TCB errors ============
    /// Invalid TCB pointer
    TcbInvalid = 29101,

    // ============ Time errors ============
    /// Cannot delay from ISR
    TimeDlyIsr = 29301,
    /// Cannot resume a delayed task from ISR
    TimeDlyResumeIsr = 29302,
    /// Hours out of range
    TimeInvalidHours = 29304,
    /// Minutes out of range
    TimeInvalidMinutes = 29305,
    /// Seconds out of range
    TimeInvalidSeconds = 29306,
    /// Milliseconds out of range
    TimeInvalidMilliseconds = 29307,
    /// Zero delay specified
    TimeZeroDly = 29310,

    // ============ Timeout ============
    /// Operation timed out
    Timeout = 29401,

    // ============ HW-RTOS errors ============
    /// Valid μC/OS-III option the hardware cannot perform
    HwosUnsupported = 70001,
    /// Every hardware slot of the requested kind is in use
    HwosRsrcNotAvail = 70002,
    /// Interrupt number outside 0..=255
    HwosIntIdInvalid = 70003,
    /// QINT slot outside the hardware table
    HwosQintIdInvalid = 70004,
    /// QINT slot already configured, not configured, or in the wrong
    /// enable state for the request
    HwosQintCfg = 70005,
}

/// Result type alias for RTOS operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    /// Numeric `OS_ERR_*` code
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == OsError::None
    }

    #[inline]
    pub fn is_err(self) -> bool {
        self != OsError::None
    }
}

/// Abort on a hardware response that is not legal at `site`.
///
/// Such a code means the slot tables and the hardware state have already
/// diverged, so no error is returned to the caller.
#[cold]
#[inline(never)]
pub fn fatal(site: &'static str, code: u16) -> ! {
    crate::error!("{}: unexpected HWOS response {:#x}", site, code);
    panic!("{}: unexpected HWOS response {:#06x}", site, code)
}

/// Abort when a transaction never produced a response: the ready bit stayed
/// clear past the spin bound, or a task resumed without a deposited reply.
#[cold]
#[inline(never)]
pub fn lost(site: &'static str) -> ! {
    crate::error!("{}: HWOS transaction lost", site);
    panic!("{}: HWOS transaction lost", site)
}
