//! Task management module
//!
//! Provides task creation, deletion, and control functions. Each task owns
//! one hardware context; the HW-RTOS keeps its state and priority and does
//! all scheduling.

mod tcb;

pub use tcb::OsTcb;

use core::ptr;

use crate::config::{CFG_STK_SIZE_MIN, HWOS_CNTX_CNT, HWOS_MAX_PRIO};
use crate::critical::critical_section;
use crate::error::{fatal, OsError, OsResult};
use crate::hwos::engine::{Command, Transaction};
use crate::hwos::outcome::{CommandOutcome, SleepOutcome, WakeOutcome};
use crate::hwos::{HwosPort, Opcode, Reg, CNTX_TYPE_TASK, SLEEP_FOREVER};
use crate::kernel::{Kernel, KernelState};
use crate::port::stk::task_stk_init;
use crate::table::ObjRef;
use crate::types::{opt, OsCtxId, OsCtxState, OsOpt, OsPrio, OsStkElement};

/// Task entry point function type
pub type OsTaskFn = fn(*mut ()) -> !;

/// Every option bit `task_create` understands
const TASK_OPT_MASK: OsOpt =
    opt::TASK_STK_CHK | opt::TASK_STK_CLR | opt::TASK_SAVE_FP | opt::TASK_NO_TLS;

impl<P: HwosPort> Kernel<P> {
    /// Create a new task
    ///
    /// Before [`start`](Kernel::start) the context record is written
    /// directly and the task becomes ready when the hardware starts. Once
    /// running, the task is given its priority and started through the
    /// command interface.
    ///
    /// # Arguments
    /// * `tcb` - Task Control Block, must not be in use
    /// * `name` - Task name for debugging
    /// * `task_fn` - Task entry point function
    /// * `arg` - Argument passed to `task_fn`
    /// * `prio` - Task priority (0 = highest, below `HWOS_MAX_PRIO`)
    /// * `stack` - Stack storage, at least `CFG_STK_SIZE_MIN` elements
    /// * `opt` - `TASK_*` options
    ///
    /// # Returns
    /// * `Ok(ctx)` - Hardware context assigned to the task
    /// * `Err(OsError::TaskCreateIsr)` - Called from an ISR
    /// * `Err(OsError::TaskOpt)` - Unknown option bits
    /// * `Err(OsError::StkInvalid)` - Empty stack
    /// * `Err(OsError::StkSizeInvalid)` - Stack below the minimum size
    /// * `Err(OsError::PrioInvalid)` - Priority reserved or out of range
    /// * `Err(OsError::ObjCreated)` - TCB already holds a task
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every context is in use
    #[allow(clippy::too_many_arguments)]
    pub fn task_create(
        &self,
        tcb: &'static OsTcb,
        name: &'static str,
        task_fn: OsTaskFn,
        arg: *mut (),
        prio: OsPrio,
        stack: &'static mut [OsStkElement],
        opt: OsOpt,
    ) -> OsResult<OsCtxId> {
        self.task_create_inner(tcb, name, task_fn, arg, prio, stack, opt, false)
    }

    /// Shared by application tasks and the idle task, which alone may take
    /// the lowest priority
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn task_create_inner(
        &self,
        tcb: &OsTcb,
        name: &'static str,
        task_fn: OsTaskFn,
        arg: *mut (),
        prio: OsPrio,
        stack: &mut [OsStkElement],
        opt: OsOpt,
        is_idle: bool,
    ) -> OsResult<OsCtxId> {
        if self.in_isr() {
            return Err(OsError::TaskCreateIsr);
        }

        if opt & !TASK_OPT_MASK != 0 {
            return Err(OsError::TaskOpt);
        }

        if stack.is_empty() {
            return Err(OsError::StkInvalid);
        }

        if stack.len() < CFG_STK_SIZE_MIN {
            return Err(OsError::StkSizeInvalid);
        }

        if prio >= HWOS_MAX_PRIO && !is_idle {
            return Err(OsError::PrioInvalid);
        }

        if tcb.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        let running = self.is_running();

        let ctx = critical_section(|cs| -> OsResult<OsCtxId> {
            let st = self.state.get(cs);
            let ctx = st.ctx_tbl.allocate(ObjRef::of(tcb))?;

            if opt & (opt::TASK_STK_CHK | opt::TASK_STK_CLR) != 0 {
                stack.fill(0);
            }
            let sp = task_stk_init(task_fn, arg, stack);
            st.stk_ptr[ctx] = sp;
            st.task_ret[ctx] = None;
            tcb.open(cs, ctx, prio, name);

            if !running {
                // The command interface only comes alive with the start command
                let port = &self.port;
                port.write(Reg::CntxType(ctx), CNTX_TYPE_TASK);
                port.write(Reg::CntxStat(ctx), OsCtxState::Ready as u32);
                port.write(Reg::InitAdd(ctx), task_fn as usize as u32);
                port.write(Reg::Prty(ctx), prio as u32 | (prio as u32) << 8);
                port.write(Reg::InitR14(ctx), sp as usize as u32);
                return Ok(ctx);
            }

            let chg_pri = Command::new(Opcode::ChgPri).r4(ctx as u32).r5(prio as u32);
            if let Transaction::Completed(reply) = self.submit(cs, &chg_pri) {
                CommandOutcome::chg_pri(reply.code).into_result("task_create")?;
            }

            let sta_tsk = Command::new(Opcode::StaTsk)
                .r4(ctx as u32)
                .r5(arg as usize as u32);
            self.submit_task(cs, &sta_tsk);
            Ok(ctx)
        })?;

        if running {
            let reply = self.take_reply("task_create");
            CommandOutcome::decode(reply.code).into_result("task_create")?;
        }

        crate::debug!("task {} created on ctx {} prio {}", name, ctx, prio);
        Ok(ctx)
    }

    /// Delete a task
    ///
    /// `None` deletes the calling task. The context is returned to the free
    /// pool before the hardware command is issued.
    ///
    /// # Returns
    /// * `Ok(())` - Task deleted
    /// * `Err(OsError::TaskDelIsr)` - Called from an ISR
    /// * `Err(OsError::TaskDelIdle)` - Target is the idle task
    /// * `Err(OsError::ObjType)` - `tcb` holds no task
    /// * `Err(OsError::TaskInvalid)` - No task is running yet
    /// * `Err(OsError::StateInvalid)` - Task already stopped
    pub fn task_del(&self, tcb: Option<&OsTcb>) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TaskDelIsr);
        }

        if tcb.is_some_and(|t| ptr::eq(t, self.idle_tcb())) {
            return Err(OsError::TaskDelIdle);
        }

        critical_section(|cs| -> OsResult<()> {
            let st = self.state.get(cs);
            let ctx = match tcb {
                Some(t) => t.check()?,
                None => st.ctx_cur,
            };
            if st.idle_ctx == Some(ctx) {
                return Err(OsError::TaskDelIdle);
            }
            if ctx >= HWOS_CNTX_CNT {
                return Err(OsError::TaskInvalid);
            }

            let raw = self.port.read(Reg::CntxStat(ctx));
            match OsCtxState::from_raw(raw) {
                Some(OsCtxState::Wait | OsCtxState::Ready | OsCtxState::Run) => {}
                Some(OsCtxState::Idle | OsCtxState::Stop) => return Err(OsError::StateInvalid),
                None => fatal("task_del", raw as u16),
            }

            let is_self = ctx == st.ctx_cur;
            match tcb {
                Some(t) => t.close(cs),
                None => {
                    if let Some(owner) = self.tcb_at(st, ctx) {
                        owner.close(cs);
                    }
                }
            }
            st.ctx_tbl.release(ctx);
            st.stk_ptr[ctx] = ptr::null_mut();
            if !is_self {
                st.task_ret[ctx] = None;
            }

            let op = if is_self { Opcode::ExtTsk } else { Opcode::TerTsk };
            self.submit_task(cs, &Command::new(op).r4(ctx as u32));
            crate::debug!("task on ctx {} deleted", ctx);
            Ok(())
        })?;

        let reply = self.take_reply("task_del");
        CommandOutcome::decode(reply.code).into_result("task_del")
    }

    /// Suspend the calling task until another task resumes it
    ///
    /// The HW-RTOS can only put the caller to sleep, so any other target is
    /// refused.
    ///
    /// # Returns
    /// * `Ok(())` - Task was resumed
    /// * `Err(OsError::TaskSuspendIsr)` - Called from an ISR
    /// * `Err(OsError::HwosUnsupported)` - `tcb` is not the calling task
    pub fn task_suspend(&self, tcb: Option<&OsTcb>) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TaskSuspendIsr);
        }

        if let Some(t) = tcb {
            if t.ctx_id().is_none() || t.ctx_id() != self.ctx_cur() {
                return Err(OsError::HwosUnsupported);
            }
        }

        let reply = self.call(&Command::new(Opcode::SlpTsk).r5(SLEEP_FOREVER));
        match SleepOutcome::decode(reply.code) {
            SleepOutcome::Woken | SleepOutcome::Released => Ok(()),
            SleepOutcome::Expired | SleepOutcome::Unrecognized(_) => fatal("task_suspend", reply.code),
        }
    }

    /// Resume a suspended task
    ///
    /// # Returns
    /// * `Ok(())` - Task resumed
    /// * `Err(OsError::TaskResumeIsr)` - Called from an ISR
    /// * `Err(OsError::TaskResumeSelf)` - `tcb` is the calling task
    /// * `Err(OsError::ObjType)` - `tcb` holds no task
    /// * `Err(OsError::TaskNotSuspended)` - Task was not suspended
    pub fn task_resume(&self, tcb: &OsTcb) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TaskResumeIsr);
        }

        if tcb.ctx_id().is_some() && tcb.ctx_id() == self.ctx_cur() {
            return Err(OsError::TaskResumeSelf);
        }

        let ctx = tcb.check()?;

        let cmd = Command::new(Opcode::WupTsk).r4(ctx as u32);
        let post = critical_section(|cs| self.submit_post(cs, &cmd));
        let reply = self.post_reply(post, "task_resume");
        WakeOutcome::decode(reply.code).into_result(OsError::TaskNotSuspended, "task_resume")
    }

    /// Change the priority of a task
    ///
    /// `None` targets the calling task.
    ///
    /// # Returns
    /// * `Ok(())` - Priority changed
    /// * `Err(OsError::TaskChangePrioIsr)` - Called from an ISR
    /// * `Err(OsError::PrioInvalid)` - Priority reserved or out of range
    /// * `Err(OsError::ObjType)` - `tcb` holds no task
    pub fn task_change_prio(&self, tcb: Option<&OsTcb>, prio: OsPrio) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TaskChangePrioIsr);
        }

        if prio >= HWOS_MAX_PRIO {
            return Err(OsError::PrioInvalid);
        }

        let ctx = match tcb {
            Some(t) => t.check()?,
            None => critical_section(|cs| self.state.get(cs).ctx_cur),
        };

        let reply = self.call(&Command::new(Opcode::ChgPri).r4(ctx as u32).r5(prio as u32));
        CommandOutcome::chg_pri(reply.code).into_result("task_change_prio")?;

        critical_section(|cs| {
            let st: &KernelState = self.state.get(cs);
            if let Some(t) = tcb.or_else(|| self.tcb_at(st, ctx)) {
                t.set_prio(prio);
            }
        });
        Ok(())
    }

    /// TCB owning a context
    pub(crate) fn tcb_at(&self, st: &KernelState, ctx: OsCtxId) -> Option<&OsTcb> {
        if st.idle_ctx == Some(ctx) {
            return Some(self.idle_tcb());
        }
        // SAFETY: application contexts are owned by `'static` TCBs, see
        // `task_create`
        st.ctx_tbl.lookup(ctx).map(|owner| unsafe { owner.as_ref::<OsTcb>() })
    }
}
