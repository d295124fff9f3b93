//! Event flag implementation
//!
//! Flag groups map onto the 16-bit hardware event flags. The hardware
//! evaluates waits itself, so only the "set" wait conditions are available;
//! "clear" conditions pass option validation and are then refused.

use crate::core::obj::ObjHeader;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::engine::{rsp, Command};
use crate::hwos::outcome::{CreateOutcome, DeleteOutcome, PendOutcome, PostOutcome};
use crate::hwos::{flg_tbl_flags, pend_timeout, HwosPort, Opcode, Reg, ID_CREATE};
use crate::kernel::Kernel;
use crate::table::ObjRef;
use crate::types::{opt, OsFlags, OsObjType, OsOpt, OsSlotId, OsTick};

use super::sem::DEL_OPTS;

const CLR_ALL: OsOpt = opt::PEND_FLAG_CLR_ALL;
const CLR_ANY: OsOpt = opt::PEND_FLAG_CLR_ANY;
const SET_ALL: OsOpt = opt::PEND_FLAG_SET_ALL;
const SET_ANY: OsOpt = opt::PEND_FLAG_SET_ANY;
const CONSUME: OsOpt = opt::PEND_FLAG_CONSUME;
const NB: OsOpt = opt::PEND_NON_BLOCKING;

/// Legal `flag_pend` options: one wait condition, optionally consuming,
/// optionally non-blocking
const FLAG_PEND_OPTS: [OsOpt; 16] = [
    CLR_ALL,
    CLR_ALL | CONSUME,
    CLR_ALL | NB,
    CLR_ALL | CONSUME | NB,
    CLR_ANY,
    CLR_ANY | CONSUME,
    CLR_ANY | NB,
    CLR_ANY | CONSUME | NB,
    SET_ALL,
    SET_ALL | CONSUME,
    SET_ALL | NB,
    SET_ALL | CONSUME | NB,
    SET_ANY,
    SET_ANY | CONSUME,
    SET_ANY | NB,
    SET_ANY | CONSUME | NB,
];

/// Legal `flag_post` options
const FLAG_POST_OPTS: [OsOpt; 4] = [
    opt::POST_FLAG_SET,
    opt::POST_FLAG_CLR,
    opt::POST_FLAG_SET | opt::POST_NO_SCHED,
    opt::POST_FLAG_CLR | opt::POST_NO_SCHED,
];

/// `R6` of `WAI_FLG`: clear the matched bits on return
const WAIT_MODE_CLEAR: u32 = 0x1;
/// `R6` of `WAI_FLG`: every requested bit must be set
const WAIT_MODE_AND: u32 = 0x2;

/// Event flag group handle
pub struct OsFlagGrp {
    pub(crate) hdr: ObjHeader,
}

impl OsFlagGrp {
    pub const fn new() -> Self {
        Self { hdr: ObjHeader::new() }
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        self.hdr.obj_type()
    }

    /// Hardware flag group backing this handle
    #[inline]
    pub fn slot(&self) -> Option<OsSlotId> {
        self.hdr.is_created().then(|| self.hdr.slot())
    }

    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        self.hdr.name()
    }
}

impl Default for OsFlagGrp {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HwosPort> Kernel<P> {
    /// Create an event flag group
    ///
    /// Hardware groups always start cleared.
    ///
    /// # Arguments
    /// * `grp` - Flag group handle, must not be in use
    /// * `name` - Group name
    /// * `flags` - Initial flags, must be 0
    ///
    /// # Returns
    /// * `Ok(())` - Group created
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::ObjCreated)` - Handle already in use
    /// * `Err(OsError::HwosUnsupported)` - Non-zero initial flags
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every hardware flag group is in use
    pub fn flag_create(&self, grp: &OsFlagGrp, name: &'static str, flags: OsFlags) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::CreateIsr);
        }

        if grp.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        if flags != 0 {
            return Err(OsError::HwosUnsupported);
        }

        let id = critical_section(|cs| -> OsResult<OsSlotId> {
            let id = self.state.get(cs).flag_tbl.allocate(ObjRef::of(grp))?;
            grp.hdr.open(cs, OsObjType::Flag, id, name);
            self.port.write(Reg::FlgTbl(id), 0);
            self.submit_task(cs, &Command::new(Opcode::CreG).r4(id as u32 | ID_CREATE));
            Ok(id)
        })?;

        let reply = self.take_reply("flag_create");
        if let Err(err) = CreateOutcome::plain(reply.code).into_result("flag_create") {
            critical_section(|cs| {
                self.state.get(cs).flag_tbl.release(id);
                grp.hdr.close(cs);
            });
            return Err(err);
        }

        crate::debug!("flag_create: {} on slot {}", name, id);
        Ok(())
    }

    /// Wait for a combination of flags
    ///
    /// # Arguments
    /// * `flags` - Bits to wait for
    /// * `timeout` - Maximum ticks to wait (0 = forever)
    /// * `opt` - `PEND_FLAG_SET_ALL` or `PEND_FLAG_SET_ANY`, optionally with
    ///   `PEND_FLAG_CONSUME` and `PEND_NON_BLOCKING`
    ///
    /// # Returns
    /// * `Ok(flags)` - Flags that satisfied the wait
    /// * `Err(OsError::PendIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Not a legal option combination
    /// * `Err(OsError::HwosUnsupported)` - Waiting for flags to clear
    /// * `Err(OsError::ObjType)` - Handle is not a live flag group
    /// * `Err(OsError::PendWouldBlock)` - Non-blocking and not satisfied
    /// * `Err(OsError::Timeout)` - Timeout expired
    /// * `Err(OsError::PendAbort)` - Wait aborted
    /// * `Err(OsError::ObjDel)` - Group deleted while waiting
    pub fn flag_pend(&self, grp: &OsFlagGrp, flags: OsFlags, timeout: OsTick, opt: OsOpt) -> OsResult<OsFlags> {
        if self.in_isr() {
            return Err(OsError::PendIsr);
        }

        if !FLAG_PEND_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        if opt & (CLR_ALL | CLR_ANY) != 0 {
            return Err(OsError::HwosUnsupported);
        }

        let id = grp.hdr.check(OsObjType::Flag)?;

        let mut mode = 0;
        if opt & CONSUME != 0 {
            mode |= WAIT_MODE_CLEAR;
        }
        if opt & SET_ALL != 0 {
            mode |= WAIT_MODE_AND;
        }

        let cmd = Command::new(Opcode::WaiG)
            .r4(id as u32)
            .r5(pend_timeout(timeout, opt & NB != 0))
            .r6(mode)
            .r7(flags as u32);
        let reply = self.call(&cmd);
        PendOutcome::decode(reply.code, rsp::FLAG_DELETED).into_result("flag_pend")?;
        Ok(reply.value as OsFlags)
    }

    /// Set or clear flags
    ///
    /// Callable from task or ISR context.
    ///
    /// # Returns
    /// * `Ok(flags)` - Group flags after the post, as held by the hardware
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live flag group
    pub fn flag_post(&self, grp: &OsFlagGrp, flags: OsFlags, opt: OsOpt) -> OsResult<OsFlags> {
        if !FLAG_POST_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = grp.hdr.check(OsObjType::Flag)?;
        let op = if opt & opt::POST_FLAG_CLR != 0 { Opcode::ClrG } else { Opcode::SetG };

        let (post, now) = critical_section(|cs| {
            let post = self.submit_post(cs, &Command::new(op).r4(id as u32).r5(flags as u32));
            (post, flg_tbl_flags(self.port.read(Reg::FlgTbl(id))))
        });

        let reply = self.post_reply(post, "flag_post");
        PostOutcome::flag(reply.code).into_result("flag_post")?;
        Ok(now)
    }

    /// Delete an event flag group
    ///
    /// # Returns
    /// * `Ok(())` - Group deleted
    /// * `Err(OsError::DelIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live flag group
    pub fn flag_del(&self, grp: &OsFlagGrp, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::DelIsr);
        }

        if !DEL_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = grp.hdr.check(OsObjType::Flag)?;
        critical_section(|cs| {
            self.state.get(cs).flag_tbl.release(id);
            grp.hdr.close(cs);
            self.submit_task(cs, &Command::new(Opcode::DelG).r4(id as u32));
        });

        let reply = self.take_reply("flag_del");
        DeleteOutcome::object(reply.code).into_result("flag_del")?;
        crate::debug!("flag_del: slot {} freed", id);
        Ok(())
    }
}
