//! Task Control Block (TCB) definition
//!
//! On the HW-RTOS most of what a classic TCB holds (ready links, pend
//! lists, tick lists, state) lives in the hardware context record. The TCB
//! only ties a task to its context id; the saved stack pointer is kept by
//! the kernel per context.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use crate::core::obj::ObjHeader;
use crate::critical::CriticalSection;
use crate::error::OsResult;
use crate::types::{OsCtxId, OsObjType, OsPrio, OsTick};

/// Task Control Block
pub struct OsTcb {
    pub(crate) hdr: ObjHeader,
    /// Priority requested at creation or by the last priority change
    prio: AtomicU8,
    /// Previous tick count, bookkeeping for periodic delays
    tick_ctr_prev: AtomicU32,
}

impl OsTcb {
    /// Create a new, uninitialized TCB
    pub const fn new() -> Self {
        Self {
            hdr: ObjHeader::new(),
            prio: AtomicU8::new(0),
            tick_ctr_prev: AtomicU32::new(0),
        }
    }

    /// Hardware context of a live task
    #[inline]
    pub fn ctx_id(&self) -> Option<OsCtxId> {
        self.hdr.is_created().then(|| self.hdr.slot())
    }

    #[inline]
    pub fn prio(&self) -> OsPrio {
        self.prio.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        self.hdr.obj_type()
    }

    #[inline]
    pub fn tick_ctr_prev(&self) -> OsTick {
        self.tick_ctr_prev.load(Ordering::Relaxed)
    }

    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        self.hdr.name()
    }

    pub(crate) fn check(&self) -> OsResult<OsCtxId> {
        self.hdr.check(OsObjType::Task)
    }

    pub(crate) fn open(&self, cs: &CriticalSection, ctx: OsCtxId, prio: OsPrio, name: &'static str) {
        self.prio.store(prio, Ordering::Relaxed);
        self.tick_ctr_prev.store(0, Ordering::Relaxed);
        self.hdr.open(cs, OsObjType::Task, ctx, name);
    }

    pub(crate) fn set_prio(&self, prio: OsPrio) {
        self.prio.store(prio, Ordering::Relaxed);
    }

    pub(crate) fn close(&self, cs: &CriticalSection) {
        self.hdr.close(cs);
    }
}

impl Default for OsTcb {
    fn default() -> Self {
        Self::new()
    }
}
