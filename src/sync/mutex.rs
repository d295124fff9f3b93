//! Mutex implementation
//!
//! A mutex is a hardware semaphore created with a maximum count of one and
//! ownership tracking. Only the owner may release it; the hardware checks
//! this and reports a foreign release.

use crate::core::obj::ObjHeader;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::engine::Command;
use crate::hwos::outcome::{CreateOutcome, PostOutcome};
use crate::hwos::{sem_tbl_init, HwosPort, Opcode};
use crate::kernel::Kernel;
use crate::types::{opt, OsObjType, OsOpt, OsSlotId, OsTick};

use super::sem::{DEL_OPTS, PEND_OPTS};

/// Legal `mutex_post` options
const MUTEX_POST_OPTS: [OsOpt; 4] = [
    opt::POST_NONE,
    opt::POST_NO_SCHED,
    opt::POST_ALL,
    opt::POST_ALL | opt::POST_NO_SCHED,
];

/// Mutual exclusion semaphore handle
pub struct OsMutex {
    pub(crate) hdr: ObjHeader,
}

impl OsMutex {
    pub const fn new() -> Self {
        Self { hdr: ObjHeader::new() }
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        self.hdr.obj_type()
    }

    /// Hardware semaphore backing this handle
    #[inline]
    pub fn slot(&self) -> Option<OsSlotId> {
        self.hdr.is_created().then(|| self.hdr.slot())
    }

    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        self.hdr.name()
    }
}

impl Default for OsMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HwosPort> Kernel<P> {
    /// Create a mutex, initially free
    ///
    /// # Returns
    /// * `Ok(())` - Mutex created
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::ObjCreated)` - Handle already in use
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every hardware semaphore is in use
    pub fn mutex_create(&self, mutex: &OsMutex, name: &'static str) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::CreateIsr);
        }

        if mutex.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        self.sem_slot_create(
            &mutex.hdr,
            OsObjType::Mutex,
            name,
            sem_tbl_init(1, false),
            1,
            CreateOutcome::plain,
            "mutex_create",
        )
    }

    /// Acquire the mutex
    ///
    /// # Arguments
    /// * `timeout` - Maximum ticks to wait (0 = forever)
    /// * `opt` - `PEND_BLOCKING` or `PEND_NON_BLOCKING`
    ///
    /// # Returns
    /// * `Ok(())` - Mutex owned by the caller
    /// * `Err(OsError::PendIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live mutex
    /// * `Err(OsError::PendWouldBlock)` - Non-blocking and owned elsewhere
    /// * `Err(OsError::Timeout)` - Timeout expired
    /// * `Err(OsError::PendAbort)` - Wait aborted
    /// * `Err(OsError::ObjDel)` - Mutex deleted while waiting
    pub fn mutex_pend(&self, mutex: &OsMutex, timeout: OsTick, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::PendIsr);
        }

        if !PEND_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = mutex.hdr.check(OsObjType::Mutex)?;
        self.sem_slot_pend(id, timeout, opt, "mutex_pend")
    }

    /// Release the mutex
    ///
    /// # Returns
    /// * `Ok(())` - Mutex released
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::HwosUnsupported)` - `POST_ALL`
    /// * `Err(OsError::ObjType)` - Handle is not a live mutex
    /// * `Err(OsError::MutexNotOwner)` - Caller does not own the mutex
    pub fn mutex_post(&self, mutex: &OsMutex, opt: OsOpt) -> OsResult<()> {
        if !MUTEX_POST_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        if opt & opt::POST_ALL != 0 {
            return Err(OsError::HwosUnsupported);
        }

        let id = mutex.hdr.check(OsObjType::Mutex)?;
        let post = critical_section(|cs| self.submit_post(cs, &Command::new(Opcode::SigSem).r4(id as u32)));

        let reply = self.post_reply(post, "mutex_post");
        PostOutcome::mutex(reply.code).into_result("mutex_post")
    }

    /// Delete a mutex
    ///
    /// # Returns
    /// * `Ok(())` - Mutex deleted
    /// * `Err(OsError::DelIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live mutex
    pub fn mutex_del(&self, mutex: &OsMutex, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::DelIsr);
        }

        if !DEL_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = mutex.hdr.check(OsObjType::Mutex)?;
        self.sem_slot_del(&mutex.hdr, id, "mutex_del")
    }
}
