//! Message queue implementation
//!
//! Each queue is a hardware mailbox carrying one pointer-sized word per
//! message. Depth and ordering are fixed by the hardware; messages are
//! delivered FIFO.

use crate::core::obj::ObjHeader;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::engine::{rsp, Command};
use crate::hwos::outcome::{CreateOutcome, DeleteOutcome, PendOutcome, PostOutcome};
use crate::hwos::{pend_timeout, HwosPort, Opcode, Reg};
use crate::kernel::Kernel;
use crate::table::ObjRef;
use crate::types::{opt, OsObjQty, OsObjType, OsOpt, OsSlotId, OsTick};

use super::sem::{DEL_OPTS, PEND_OPTS};

/// Legal `q_post` options. Broadcast and scheduler suppression have no
/// hardware counterpart and are accepted as plain posts.
const Q_POST_OPTS: [OsOpt; 8] = [
    opt::POST_FIFO,
    opt::POST_LIFO,
    opt::POST_FIFO | opt::POST_ALL,
    opt::POST_LIFO | opt::POST_ALL,
    opt::POST_FIFO | opt::POST_NO_SCHED,
    opt::POST_LIFO | opt::POST_NO_SCHED,
    opt::POST_FIFO | opt::POST_ALL | opt::POST_NO_SCHED,
    opt::POST_LIFO | opt::POST_ALL | opt::POST_NO_SCHED,
];

/// Message queue handle
pub struct OsQ {
    pub(crate) hdr: ObjHeader,
}

impl OsQ {
    pub const fn new() -> Self {
        Self { hdr: ObjHeader::new() }
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        self.hdr.obj_type()
    }

    /// Hardware mailbox backing this handle
    #[inline]
    pub fn slot(&self) -> Option<OsSlotId> {
        self.hdr.is_created().then(|| self.hdr.slot())
    }

    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        self.hdr.name()
    }
}

impl Default for OsQ {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HwosPort> Kernel<P> {
    /// Create a message queue
    ///
    /// # Arguments
    /// * `q` - Queue handle, must not be in use
    /// * `name` - Queue name
    /// * `max_qty` - Requested depth; must be non-zero, the mailbox depth
    ///   itself is fixed by the hardware
    ///
    /// # Returns
    /// * `Ok(())` - Queue created
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::ObjCreated)` - Handle already in use
    /// * `Err(OsError::QSize)` - Zero depth
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every hardware mailbox is in use
    pub fn q_create(&self, q: &OsQ, name: &'static str, max_qty: OsObjQty) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::CreateIsr);
        }

        if q.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        if max_qty == 0 {
            return Err(OsError::QSize);
        }

        let id = critical_section(|cs| -> OsResult<OsSlotId> {
            let id = self.state.get(cs).mbx_tbl.allocate(ObjRef::of(q))?;
            q.hdr.open(cs, OsObjType::Queue, id, name);
            self.port.write(Reg::MbxTbl(id), 0);
            self.submit_task(cs, &Command::new(Opcode::CreMbx).r4(id as u32));
            Ok(id)
        })?;

        let reply = self.take_reply("q_create");
        if let Err(err) = CreateOutcome::plain(reply.code).into_result("q_create") {
            critical_section(|cs| {
                self.state.get(cs).mbx_tbl.release(id);
                q.hdr.close(cs);
            });
            return Err(err);
        }

        crate::debug!("q_create: {} on slot {}", name, id);
        Ok(())
    }

    /// Send a message
    ///
    /// Callable from task or ISR context.
    ///
    /// # Arguments
    /// * `msg` - Message word delivered to the receiver
    /// * `opt` - `POST_FIFO`, optionally with `POST_ALL` / `POST_NO_SCHED`
    ///
    /// # Returns
    /// * `Ok(())` - Message queued or handed to a waiting task
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::HwosUnsupported)` - `POST_LIFO`
    /// * `Err(OsError::ObjType)` - Handle is not a live queue
    /// * `Err(OsError::QFull)` - Mailbox full
    pub fn q_post(&self, q: &OsQ, msg: *mut (), opt: OsOpt) -> OsResult<()> {
        if !Q_POST_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        if opt & opt::POST_LIFO != 0 {
            return Err(OsError::HwosUnsupported);
        }

        let id = q.hdr.check(OsObjType::Queue)?;
        let cmd = Command::new(Opcode::SndMbx).r4(id as u32).r5(msg as usize as u32);
        let post = critical_section(|cs| self.submit_post(cs, &cmd));

        let reply = self.post_reply(post, "q_post");
        PostOutcome::queue(reply.code).into_result("q_post")
    }

    /// Receive a message
    ///
    /// # Arguments
    /// * `timeout` - Maximum ticks to wait (0 = forever)
    /// * `opt` - `PEND_BLOCKING` or `PEND_NON_BLOCKING`
    ///
    /// # Returns
    /// * `Ok(msg)` - Message received
    /// * `Err(OsError::PendIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live queue
    /// * `Err(OsError::PendWouldBlock)` - Non-blocking and empty
    /// * `Err(OsError::Timeout)` - Timeout expired
    /// * `Err(OsError::PendAbort)` - Wait aborted
    /// * `Err(OsError::ObjDel)` - Queue deleted while waiting
    pub fn q_pend(&self, q: &OsQ, timeout: OsTick, opt: OsOpt) -> OsResult<*mut ()> {
        if self.in_isr() {
            return Err(OsError::PendIsr);
        }

        if !PEND_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = q.hdr.check(OsObjType::Queue)?;
        let timeout = pend_timeout(timeout, opt & opt::PEND_NON_BLOCKING != 0);
        let reply = self.call(&Command::new(Opcode::RcvMbx).r4(id as u32).r5(timeout));
        PendOutcome::decode(reply.code, rsp::MBX_DELETED).into_result("q_pend")?;
        Ok(reply.value as usize as *mut ())
    }

    /// Delete a message queue
    ///
    /// # Returns
    /// * `Ok(())` - Queue deleted
    /// * `Err(OsError::DelIsr)` - Called from an ISR
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - Handle is not a live queue
    pub fn q_del(&self, q: &OsQ, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::DelIsr);
        }

        if !DEL_OPTS.contains(&opt) {
            return Err(OsError::OptInvalid);
        }

        let id = q.hdr.check(OsObjType::Queue)?;
        critical_section(|cs| {
            self.state.get(cs).mbx_tbl.release(id);
            q.hdr.close(cs);
            self.submit_task(cs, &Command::new(Opcode::DelMbx).r4(id as u32));
        });

        let reply = self.take_reply("q_del");
        DeleteOutcome::plain(reply.code).into_result("q_del")?;
        crate::debug!("q_del: slot {} freed", id);
        Ok(())
    }
}
