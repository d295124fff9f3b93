//! Semaphore implementation
//!
//! Counting semaphores backed by HW-RTOS semaphore slots. The hardware keeps
//! the count (at most `HWOS_SEM_VAL_MAX`) and the wait queue; the count is
//! read back from the shadow table after every operation.
//!
//! Mutexes use the same slot table and commands, see [`mutex`](super::mutex).

use crate::config::HWOS_SEM_VAL_MAX;
use crate::core::obj::ObjHeader;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::engine::{rsp, Command};
use crate::hwos::outcome::{CreateOutcome, DeleteOutcome, PendOutcome, PostOutcome};
use crate::hwos::{pend_timeout, sem_tbl_count, sem_tbl_init, HwosPort, Opcode, Reg, ID_CREATE};
use crate::kernel::Kernel;
use crate::table::ObjRef;
use crate::types::{opt, OsObjType, OsOpt, OsSemCtr, OsSlotId, OsTick};

/// Legal `sem_post` options
const SEM_POST_OPTS: [OsOpt; 4] = [
    opt::POST_1,
    opt::POST_ALL,
    opt::POST_1 | opt::POST_NO_SCHED,
    opt::POST_ALL | opt::POST_NO_SCHED,
];

/// Legal pend options, shared by semaphores, mutexes and queues
pub(crate) const PEND_OPTS: [OsOpt; 2] = [opt::PEND_BLOCKING, opt::PEND_NON_BLOCKING];

/// Legal delete options
pub(crate) const DEL_OPTS: [OsOpt; 2] = [opt::DEL_NO_PEND, opt::DEL_ALWAYS];

/// Counting semaphore handle
pub struct OsSem {
    pub(crate) hdr: ObjHeader,
}

impl OsSem {
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

impl Default for OsSem {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HwosPort> Kernel<P> {
    /// Create a semaphore
    ///
    /// # Arguments
    /// * `sem` - Semaphore handle, must not be in use
    /// * `name` - Semaphore name
    /// * `cnt` - Initial count, at most `HWOS_SEM_VAL_MAX`
    ///
    /// # Returns
    /// * `Ok(())` - Semaphore created
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::ObjCreated)` - Handle already in use
    /// * `Err(OsError::SemOvf)` - Initial count too large
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every hardware semaphore is in use
    pub fn sem_create(&self, sem: &OsSem, name: &'static str, cnt: OsSemCtr) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::CreateIsr);
        }

        if sem.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        if cnt > HWOS_SEM_VAL_MAX {
            return Err(OsError::SemOvf);
        }

        self.sem_slot_create(
            &sem.hdr,
            OsObjType::Sem,
            name,
            sem_tbl_init(HWOS_SEM_VAL_MAX, true),
            cnt,
            CreateOutcome::sem,
            "sem_create",
        )
    }

    /// Wait on (pend) the semaphore
    ///
    /// # Arguments
    /// * `timeout` - Maximum ticks to wait (0 = forever)
    /// * `opt` - `PEND_BLOCKING` or `PEND_NON_BLOCKING`
    ///
    /// # Returns
    /// * `Ok(count)` - Semaphore acquired, returns the count left
    /// * `Err(OsError::PendIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live semaphore
    /// * `Err(OsError::PendWouldBlock)` - Non-blocking and not available
    /// * `Err(OsError::Timeout)` - Timeout expired
    /// * `Err(OsError::PendAbort)` - Wait aborted
    /// * `Err(OsError::ObjDel)` - Semaphore deleted while waiting
    pub fn sem_pend(&self, sem: &OsSem, timeout: OsTick, opt: OsOpt) -> OsResult<OsSemCtr> {
        if self.in_isr() {
            return Err(OsError::PendIsr);
        }

        if !PEND_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = sem.hdr.check(OsObjType::Sem)?;
        self.sem_slot_pend(id, timeout, opt, "sem_pend")?;
        Ok(sem_tbl_count(self.port.read(Reg::SemTbl(id))))
    }

    /// Signal (post) the semaphore
    ///
    /// Callable from task or ISR context.
    ///
    /// # Returns
    /// * `Ok(count)` - Count after the post, as held by the hardware
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::HwosUnsupported)` - `POST_ALL`
    /// * `Err(OsError::ObjType)` - Handle is not a live semaphore
    /// * `Err(OsError::SemOvf)` - Count already at its maximum
    pub fn sem_post(&self, sem: &OsSem, opt: OsOpt) -> OsResult<OsSemCtr> {
        if !SEM_POST_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        if opt & opt::POST_ALL != 0 {
            return Err(OsError::HwosUnsupported);
        }

        let id = sem.hdr.check(OsObjType::Sem)?;
        let (post, cnt) = critical_section(|cs| {
            let post = self.submit_post(cs, &Command::new(Opcode::SigSem).r4(id as u32));
            (post, sem_tbl_count(self.port.read(Reg::SemTbl(id))))
        });

        let reply = self.post_reply(post, "sem_post");
        PostOutcome::sem(reply.code).into_result("sem_post")?;
        Ok(cnt)
    }

    /// Delete a semaphore
    ///
    /// Tasks waiting on it are released with `ObjDel`.
    ///
    /// # Returns
    /// * `Ok(())` - Semaphore deleted
    /// * `Err(OsError::DelIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live semaphore
    pub fn sem_del(&self, sem: &OsSem, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::DelIsr);
        }

        if !DEL_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = sem.hdr.check(OsObjType::Sem)?;
        self.sem_slot_del(&sem.hdr, id, "sem_del")
    }

    // ============ Shared with mutexes ============

    /// Claim a hardware semaphore, program its shadow entry and create it.
    /// A refused create gives the slot back.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn sem_slot_create(
        &self,
        hdr: &ObjHeader,
        ty: OsObjType,
        name: &'static str,
        shadow: u32,
        cnt: u32,
        decode: fn(u16) -> CreateOutcome,
        site: &'static str,
    ) -> OsResult<()> {
        let id = critical_section(|cs| -> OsResult<OsSlotId> {
            let id = self.state.get(cs).sem_tbl.allocate(ObjRef::of(hdr))?;
            hdr.open(cs, ty, id, name);
            self.port.write(Reg::SemTbl(id), shadow);

            let cmd = Command::new(Opcode::CreSem).r4(id as u32 | ID_CREATE).r5(cnt);
            self.submit_task(cs, &cmd);
            Ok(id)
        })?;

        let reply = self.take_reply(site);
        if let Err(err) = decode(reply.code).into_result(site) {
            critical_section(|cs| {
                self.state.get(cs).sem_tbl.release(id);
                self.port.write(Reg::SemTbl(id), 0);
                hdr.close(cs);
            });
            crate::warn!("{}: refused by hardware, slot {} released", site, id);
            return Err(err);
        }

        crate::debug!("{}: {} on slot {}", site, name, id);
        Ok(())
    }

    pub(crate) fn sem_slot_pend(&self, id: OsSlotId, timeout: OsTick, opt: OsOpt, site: &'static str) -> OsResult<()> {
        let timeout = pend_timeout(timeout, opt & opt::PEND_NON_BLOCKING != 0);
        let reply = self.call(&Command::new(Opcode::WaiSem).r4(id as u32).r5(timeout));
        PendOutcome::decode(reply.code, rsp::SEM_DELETED).into_result(site)
    }

    /// Free the slot and invalidate the handle, then delete in hardware
    pub(crate) fn sem_slot_del(&self, hdr: &ObjHeader, id: OsSlotId, site: &'static str) -> OsResult<()> {
        critical_section(|cs| {
            self.state.get(cs).sem_tbl.release(id);
            hdr.close(cs);
            self.submit_task(cs, &Command::new(Opcode::DelSem).r4(id as u32));
        });

        let reply = self.take_reply(site);
        DeleteOutcome::object(reply.code).into_result(site)?;
        crate::debug!("{}: slot {} freed", site, id);
        Ok(())
    }
}
