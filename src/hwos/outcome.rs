//! Per-call decoding of HW-RTOS result codes
//!
//! Each family of calls accepts a fixed set of result codes. Anything else
//! decodes to `Unrecognized` and [`into_result`](PendOutcome::into_result)
//! aborts through [`fatal`]: the slot tables and the hardware no longer
//! agree, so there is no error to hand back.

use crate::error::{fatal, OsError, OsResult};

use super::engine::rsp;

/// Create commands (`CRE_SEM`, `CRE_G`, `CRE_MBX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Initial count above the hardware maximum
    CountInvalid,
    Unrecognized(u16),
}

impl CreateOutcome {
    /// `CRE_SEM` for a counting semaphore
    pub const fn sem(code: u16) -> Self {
        match code {
            rsp::OK => CreateOutcome::Created,
            rsp::INVALID_OR_ABORTED => CreateOutcome::CountInvalid,
            other => CreateOutcome::Unrecognized(other),
        }
    }

    /// Creates with no recoverable failure
    pub const fn plain(code: u16) -> Self {
        match code {
            rsp::OK => CreateOutcome::Created,
            other => CreateOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            CreateOutcome::Created => Ok(()),
            CreateOutcome::CountInvalid => Err(OsError::SemOvf),
            CreateOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// Wait commands (`WAI_SEM`, `WAI_G`, `RCV_MBX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendOutcome {
    Acquired,
    WouldBlock,
    Timeout,
    Aborted,
    Deleted,
    Unrecognized(u16),
}

impl PendOutcome {
    /// `deleted` is the object-specific "deleted while waiting" code
    pub const fn decode(code: u16, deleted: u16) -> Self {
        match code {
            rsp::OK | rsp::OK_WAITED => PendOutcome::Acquired,
            rsp::POLL_FAIL => PendOutcome::WouldBlock,
            rsp::TIMEOUT => PendOutcome::Timeout,
            rsp::INVALID_OR_ABORTED => PendOutcome::Aborted,
            c if c == deleted => PendOutcome::Deleted,
            other => PendOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            PendOutcome::Acquired => Ok(()),
            PendOutcome::WouldBlock => Err(OsError::PendWouldBlock),
            PendOutcome::Timeout => Err(OsError::Timeout),
            PendOutcome::Aborted => Err(OsError::PendAbort),
            PendOutcome::Deleted => Err(OsError::ObjDel),
            PendOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// Signal commands (`SIG_SEM`, `SET_G`/`CLR_G`, `SND_MBX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Posted,
    Overflow,
    NotOwner,
    Full,
    Unrecognized(u16),
}

impl PostOutcome {
    pub const fn sem(code: u16) -> Self {
        match code {
            rsp::OK => PostOutcome::Posted,
            rsp::OVERFLOW => PostOutcome::Overflow,
            other => PostOutcome::Unrecognized(other),
        }
    }

    /// Release of a mutex; ownership is checked by the hardware
    pub const fn mutex(code: u16) -> Self {
        match code {
            rsp::OK => PostOutcome::Posted,
            rsp::NOT_OWNER | rsp::OVERFLOW => PostOutcome::NotOwner,
            other => PostOutcome::Unrecognized(other),
        }
    }

    pub const fn flag(code: u16) -> Self {
        match code {
            rsp::OK => PostOutcome::Posted,
            other => PostOutcome::Unrecognized(other),
        }
    }

    pub const fn queue(code: u16) -> Self {
        match code {
            rsp::OK => PostOutcome::Posted,
            rsp::MBX_FULL => PostOutcome::Full,
            other => PostOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            PostOutcome::Posted => Ok(()),
            PostOutcome::Overflow => Err(OsError::SemOvf),
            PostOutcome::NotOwner => Err(OsError::MutexNotOwner),
            PostOutcome::Full => Err(OsError::QFull),
            PostOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// Delete commands (`DEL_SEM`, `DEL_G`, `DEL_MBX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The hardware had no such object
    NoObject,
    Unrecognized(u16),
}

impl DeleteOutcome {
    pub const fn object(code: u16) -> Self {
        match code {
            rsp::OK => DeleteOutcome::Deleted,
            rsp::NO_OBJECT => DeleteOutcome::NoObject,
            other => DeleteOutcome::Unrecognized(other),
        }
    }

    pub const fn plain(code: u16) -> Self {
        match code {
            rsp::OK => DeleteOutcome::Deleted,
            other => DeleteOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::NoObject => Err(OsError::ObjType),
            DeleteOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// Task commands with no recoverable failure (`STA_TSK`, `EXT_TSK`,
/// `TER_TSK`, `CHG_PRI`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    Unrecognized(u16),
}

impl CommandOutcome {
    pub const fn decode(code: u16) -> Self {
        match code {
            rsp::OK => CommandOutcome::Done,
            other => CommandOutcome::Unrecognized(other),
        }
    }

    pub const fn chg_pri(code: u16) -> Self {
        match code {
            rsp::OK | rsp::OK_REQUEUED => CommandOutcome::Done,
            other => CommandOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            CommandOutcome::Done => Ok(()),
            CommandOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// `SLP_TSK`: every legal way out of a sleep is a success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Expired,
    Woken,
    Released,
    Unrecognized(u16),
}

impl SleepOutcome {
    pub const fn decode(code: u16) -> Self {
        match code {
            rsp::TIMEOUT => SleepOutcome::Expired,
            rsp::WOKEN => SleepOutcome::Woken,
            rsp::RELEASED => SleepOutcome::Released,
            other => SleepOutcome::Unrecognized(other),
        }
    }

    pub fn into_result(self, site: &'static str) -> OsResult<()> {
        match self {
            SleepOutcome::Expired | SleepOutcome::Woken | SleepOutcome::Released => Ok(()),
            SleepOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}

/// `WUP_TSK` / `REL_WAI` addressed to another task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    Woken,
    /// Target was not in the expected wait
    NotWaiting,
    Unrecognized(u16),
}

impl WakeOutcome {
    pub const fn decode(code: u16) -> Self {
        match code {
            rsp::OK => WakeOutcome::Woken,
            rsp::NOT_WAITING_B | rsp::NOT_WAITING_C | rsp::NOT_WAITING_E => WakeOutcome::NotWaiting,
            other => WakeOutcome::Unrecognized(other),
        }
    }

    /// `not_waiting` is the error reported when the target was not asleep
    pub fn into_result(self, not_waiting: OsError, site: &'static str) -> OsResult<()> {
        match self {
            WakeOutcome::Woken => Ok(()),
            WakeOutcome::NotWaiting => Err(not_waiting),
            WakeOutcome::Unrecognized(code) => fatal(site, code),
        }
    }
}
