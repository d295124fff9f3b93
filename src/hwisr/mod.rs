//! Hardware ISR (QINT) bindings
//!
//! A QINT slot ties an interrupt line to an action the HW-RTOS performs on
//! its own when the line fires: signal a semaphore, set event flags or wake
//! a task. No software handler runs and no command is submitted; binding is
//! plain register programming.
//!
//! A slot is configured by one of the `*_set` calls, then enabled and
//! disabled at will, and finally cleared before it can be bound again.

use crate::config::HWOS_HWISR_CNT;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::{HwosPort, Reg, QINTSEL_EN};
use crate::kernel::Kernel;
use crate::sync::flag::OsFlagGrp;
use crate::sync::sem::OsSem;
use crate::task::OsTcb;
use crate::types::{opt, OsFlags, OsHwisrAction, OsObjType, OsOpt, OsSlotId};

/// QINT slot id
pub type OsQintId = usize;

/// Interrupt line routed to a QINT slot
pub type OsIntId = u32;

/// Largest interrupt number `QINTSEL` can route
const INT_ID_MAX: OsIntId = 255;

/// Parameter of actions that take a count, one wake or signal per event
const ACTION_PARAM_ONE: u32 = 7;

/// Build a `HWISP_OPR` action word
#[inline]
pub const fn action_word(action: OsHwisrAction, param: u32, id: OsSlotId) -> u32 {
    (action as u32) << 24 | param << 8 | id as u32
}

impl<P: HwosPort> Kernel<P> {
    /// Signal `sem` each time interrupt `int_id` fires
    ///
    /// # Arguments
    /// * `sem` - Semaphore to signal
    /// * `qint` - QINT slot to bind
    /// * `int_id` - Interrupt line (0-255)
    /// * `opt` - `QINT_ENABLED` or `QINT_DISABLED`
    ///
    /// # Returns
    /// * `Ok(())` - Slot bound
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::HwosQintIdInvalid)` - No such QINT slot
    /// * `Err(OsError::HwosIntIdInvalid)` - Interrupt number out of range
    /// * `Err(OsError::OptInvalid)` - Unknown option
    /// * `Err(OsError::ObjType)` - `sem` is not a live semaphore
    /// * `Err(OsError::HwosQintCfg)` - Slot already bound or enabled
    pub fn hwisr_sem_post_set(&self, sem: &OsSem, qint: OsQintId, int_id: OsIntId, opt: OsOpt) -> OsResult<()> {
        self.hwisr_check_args(qint, int_id, opt)?;
        let id = sem.hdr.check(OsObjType::Sem)?;
        self.hwisr_bind(qint, int_id, action_word(OsHwisrAction::SigSem, ACTION_PARAM_ONE, id), opt)
    }

    /// Set `flags` in `grp` each time interrupt `int_id` fires
    ///
    /// # Returns
    /// * `Ok(())` - Slot bound
    /// * `Err(OsError::ObjType)` - `grp` is not a live flag group
    /// * Other errors as [`hwisr_sem_post_set`](Kernel::hwisr_sem_post_set)
    pub fn hwisr_flag_post_set(
        &self,
        grp: &OsFlagGrp,
        flags: OsFlags,
        qint: OsQintId,
        int_id: OsIntId,
        opt: OsOpt,
    ) -> OsResult<()> {
        self.hwisr_check_args(qint, int_id, opt)?;
        let id = grp.hdr.check(OsObjType::Flag)?;
        self.hwisr_bind(qint, int_id, action_word(OsHwisrAction::SetFlag, flags as u32, id), opt)
    }

    /// Wake `tcb` each time interrupt `int_id` fires
    ///
    /// # Returns
    /// * `Ok(())` - Slot bound
    /// * `Err(OsError::ObjType)` - `tcb` holds no task
    /// * Other errors as [`hwisr_sem_post_set`](Kernel::hwisr_sem_post_set)
    pub fn hwisr_task_resume_set(&self, tcb: &OsTcb, qint: OsQintId, int_id: OsIntId, opt: OsOpt) -> OsResult<()> {
        self.hwisr_check_args(qint, int_id, opt)?;
        let ctx = tcb.check()?;
        self.hwisr_bind(qint, int_id, action_word(OsHwisrAction::WupTsk, ACTION_PARAM_ONE, ctx), opt)
    }

    /// Enable a bound QINT slot
    ///
    /// # Returns
    /// * `Ok(())` - Slot enabled
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::HwosQintIdInvalid)` - No such QINT slot
    /// * `Err(OsError::HwosQintCfg)` - Slot not bound, or already enabled
    pub fn hwisr_en(&self, qint: OsQintId) -> OsResult<()> {
        self.hwisr_check_slot(qint)?;

        critical_section(|_| {
            let qint_reg = self.port.read(Reg::Qint);
            if self.port.read(Reg::HwispOpr(qint)) == 0 || qint_reg & (1 << qint) != 0 {
                return Err(OsError::HwosQintCfg);
            }
            self.port.write(Reg::Qint, qint_reg | 1 << qint);
            Ok(())
        })
    }

    /// Disable a bound QINT slot
    ///
    /// # Returns
    /// * `Ok(())` - Slot disabled
    /// * `Err(OsError::CreateIsr)` - Called from an ISR
    /// * `Err(OsError::HwosQintIdInvalid)` - No such QINT slot
    /// * `Err(OsError::HwosQintCfg)` - Slot not bound, or already disabled
    pub fn hwisr_dis(&self, qint: OsQintId) -> OsResult<()> {
        self.hwisr_check_slot(qint)?;

        critical_section(|_| {
            let qint_reg = self.port.read(Reg::Qint);
            if self.port.read(Reg::HwispOpr(qint)) == 0 || qint_reg & (1 << qint) == 0 {
                return Err(OsError::HwosQintCfg);
            }
            self.port.write(Reg::Qint, qint_reg & !(1 << qint));
            Ok(())
        })
    }

    /// Unbind a QINT slot, disabling it first
    pub fn hwisr_clr(&self, qint: OsQintId) -> OsResult<()> {
        self.hwisr_check_slot(qint)?;

        critical_section(|_| {
            let qint_reg = self.port.read(Reg::Qint);
            if qint_reg & (1 << qint) != 0 {
                self.port.write(Reg::Qint, qint_reg & !(1 << qint));
            }
            self.port.write(Reg::QintSel(qint), 0);
            self.port.write(Reg::HwispOpr(qint), 0);
        });
        crate::debug!("hwisr: qint {} cleared", qint);
        Ok(())
    }

    // ============ Helpers ============

    fn hwisr_check_slot(&self, qint: OsQintId) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::CreateIsr);
        }

        if qint >= HWOS_HWISR_CNT {
            return Err(OsError::HwosQintIdInvalid);
        }
        Ok(())
    }

    fn hwisr_check_args(&self, qint: OsQintId, int_id: OsIntId, opt: OsOpt) -> OsResult<()> {
        self.hwisr_check_slot(qint)?;

        if int_id > INT_ID_MAX {
            return Err(OsError::HwosIntIdInvalid);
        }

        match opt {
            opt::QINT_ENABLED | opt::QINT_DISABLED => Ok(()),
            _ => Err(OsError::OptInvalid),
        }
    }

    fn hwisr_bind(&self, qint: OsQintId, int_id: OsIntId, action: u32, opt: OsOpt) -> OsResult<()> {
        critical_section(|_| {
            if self.port.read(Reg::HwispOpr(qint)) != 0 || self.port.read(Reg::QintSel(qint)) != 0 {
                return Err(OsError::HwosQintCfg);
            }

            let qint_reg = self.port.read(Reg::Qint);
            if qint_reg & (1 << qint) != 0 {
                return Err(OsError::HwosQintCfg);
            }

            self.port.write(Reg::QintSel(qint), int_id | QINTSEL_EN);
            self.port.write(Reg::HwispOpr(qint), action);
            if opt & opt::QINT_DISABLED == 0 {
                self.port.write(Reg::Qint, qint_reg | 1 << qint);
            }
            Ok(())
        })?;

        crate::debug!("hwisr: qint {} bound to int {} action {:#x}", qint, int_id, action);
        Ok(())
    }
}
