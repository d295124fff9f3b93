//! Kernel state and initialization
//!
//! [`Kernel`] owns the HW-RTOS port and every piece of software state the
//! API layer keeps next to the hardware: the slot tables, the per-context
//! return slots, saved stack pointers and the pending context switch. The
//! hardware does all scheduling; the kernel only tracks what it needs to
//! talk to it and to hand the dispatcher the next stack.

use core::ptr;

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{
    CFG_IDLE_TASK_STK_SIZE, CFG_PRIO_IDLE, HWOS_CNTX_CNT, HWOS_CNTX_NONE, HWOS_FLAG_CNT, HWOS_Q_CNT,
    HWOS_SEM_CNT,
};
use crate::core::cs_cell::CsCell;
use crate::critical::{critical_section, CriticalSection};
use crate::error::{OsError, OsResult};
use crate::hwos::engine::{Reply, Transaction};
use crate::hwos::{
    HwosPort, Reg, CMD_START, CNTX_TYPE_TASK, HWISR_PNTR_BASE, HWISR_PNTR_CNT, HWISR_PNTR_STEP,
};
use crate::table::{CtxTable, FlagTable, MbxTable, SemTable};
use crate::task::OsTcb;
use crate::types::{opt, OsCtxId, OsCtxState, OsNestingCtr, OsStkElement};

/// Return slots and saved stacks have one extra entry for "no task yet",
/// used by calls made before the first context switch.
const CTX_SLOTS: usize = HWOS_CNTX_CNT + 1;

// ============ Kernel State Structures ============

/// Atomic kernel flags
pub struct KernelFlags {
    initialized: AtomicBool,
    running: AtomicBool,
    int_nesting: AtomicU8,
    switch_pending: AtomicBool,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            int_nesting: AtomicU8::new(0),
            switch_pending: AtomicBool::new(false),
        }
    }

    pub(crate) fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.int_nesting.store(0, Ordering::SeqCst);
        self.switch_pending.store(false, Ordering::SeqCst);
    }

    /// Check if the OS is running
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Check if OS is initialized
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Get interrupt nesting level
    #[inline(always)]
    pub fn int_nesting(&self) -> OsNestingCtr {
        self.int_nesting.load(Ordering::Relaxed)
    }

    /// A switch requested from an ISR waits for the outermost exit
    #[inline(always)]
    pub fn switch_pending(&self) -> bool {
        self.switch_pending.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn set_switch_pending(&self) {
        self.switch_pending.store(true, Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn take_switch_pending(&self) -> bool {
        self.switch_pending.swap(false, Ordering::AcqRel)
    }

    /// Enter ISR
    #[inline(always)]
    pub(crate) fn int_enter(&self) {
        if self.is_running() {
            let nesting = self.int_nesting.load(Ordering::Relaxed);
            self.int_nesting.store(nesting.saturating_add(1), Ordering::Relaxed);
        }
    }

    /// Decrement int nesting
    #[inline(always)]
    pub(crate) fn int_nesting_dec(&self) -> OsNestingCtr {
        let nesting = self.int_nesting.load(Ordering::Relaxed).saturating_sub(1);
        self.int_nesting.store(nesting, Ordering::Relaxed);
        nesting
    }

    #[inline(always)]
    pub(crate) fn set_initialized(&self, val: bool) {
        self.initialized.store(val, Ordering::SeqCst);
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, val: bool) {
        self.running.store(val, Ordering::SeqCst);
    }
}

/// Software state kept next to the hardware, guarded by the critical section
pub struct KernelState {
    /// Context the hardware is currently running
    pub(crate) ctx_cur: OsCtxId,
    /// Context the dispatcher must switch to next
    pub(crate) pend_ctx_sw: OsCtxId,
    /// Reply deposited for each context, consumed once it runs again
    pub(crate) task_ret: [Option<Reply>; CTX_SLOTS],
    /// Saved stack pointer of each context while it is not running
    pub(crate) stk_ptr: [*mut OsStkElement; CTX_SLOTS],

    pub(crate) ctx_tbl: CtxTable,
    pub(crate) sem_tbl: SemTable,
    pub(crate) flag_tbl: FlagTable,
    pub(crate) mbx_tbl: MbxTable,

    pub(crate) idle_ctx: Option<OsCtxId>,
    /// Memory partitions created since init
    #[cfg(feature = "mem")]
    pub(crate) mem_qty: u16,
}

impl KernelState {
    const fn new() -> Self {
        Self {
            ctx_cur: HWOS_CNTX_NONE,
            pend_ctx_sw: HWOS_CNTX_NONE,
            task_ret: [None; CTX_SLOTS],
            stk_ptr: [ptr::null_mut(); CTX_SLOTS],
            ctx_tbl: CtxTable::new(),
            sem_tbl: SemTable::new(),
            flag_tbl: FlagTable::new(),
            mbx_tbl: MbxTable::new(),
            idle_ctx: None,
            #[cfg(feature = "mem")]
            mem_qty: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

// ============ Kernel ============

/// μC/OS-III kernel bound to one HW-RTOS instance
pub struct Kernel<P: HwosPort> {
    pub(crate) port: P,
    pub(crate) flags: KernelFlags,
    pub(crate) state: CsCell<KernelState>,
    idle_tcb: OsTcb,
    idle_stk: CsCell<[OsStkElement; CFG_IDLE_TASK_STK_SIZE]>,
}

/// Idle task body; the hardware runs it whenever nothing else is ready
fn os_idle_task(_: *mut ()) -> ! {
    loop {
        core::hint::spin_loop();
    }
}

impl<P: HwosPort> Kernel<P> {
    pub const fn new(port: P) -> Self {
        Self {
            port,
            flags: KernelFlags::new(),
            state: CsCell::new(KernelState::new()),
            idle_tcb: OsTcb::new(),
            idle_stk: CsCell::new([0; CFG_IDLE_TASK_STK_SIZE]),
        }
    }

    #[inline(always)]
    pub fn port(&self) -> &P {
        &self.port
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.flags.is_running()
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.flags.is_initialized()
    }

    #[inline(always)]
    pub fn int_nesting(&self) -> OsNestingCtr {
        self.flags.int_nesting()
    }

    #[inline(always)]
    pub(crate) fn in_isr(&self) -> bool {
        self.flags.int_nesting() > 0
    }

    /// Context currently running, `None` before the first switch
    pub fn ctx_cur(&self) -> Option<OsCtxId> {
        let cur = critical_section(|cs| self.state.get(cs).ctx_cur);
        (cur < HWOS_CNTX_CNT).then_some(cur)
    }

    /// Context the dispatcher will switch to next
    pub fn pending_switch(&self) -> Option<OsCtxId> {
        let pend = critical_section(|cs| self.state.get(cs).pend_ctx_sw);
        (pend < HWOS_CNTX_CNT).then_some(pend)
    }

    /// Whether an ISR-path transaction left a switch for the interrupt exit
    #[inline(always)]
    pub fn switch_pending(&self) -> bool {
        self.flags.switch_pending()
    }

    /// Reply waiting in the return slot of `ctx`, without consuming it
    pub fn task_reply(&self, ctx: OsCtxId) -> Option<Reply> {
        critical_section(|cs| self.state.get(cs).task_ret.get(ctx).copied().flatten())
    }

    /// Hardware state of a task context
    pub fn ctx_state(&self, ctx: OsCtxId) -> Option<OsCtxState> {
        OsCtxState::from_raw(self.port.read(Reg::CntxStat(ctx)))
    }

    pub fn idle_tcb(&self) -> &OsTcb {
        &self.idle_tcb
    }

    // ============ Initialization ============

    /// Initialize the kernel and the HW-RTOS tables
    ///
    /// Must be called before any other kernel function. Every context is
    /// parked in STOP, the shadow tables and QINT enables are cleared and
    /// the idle task is created at the lowest priority.
    ///
    /// # Returns
    /// * `Ok(())` - Initialization successful
    /// * `Err(OsError::OsRunning)` - OS is already running
    pub fn init(&self) -> OsResult<()> {
        if self.is_running() {
            return Err(OsError::OsRunning);
        }

        self.flags.reset();

        critical_section(|cs| {
            self.state.get(cs).reset();
            self.idle_tcb.close(cs);

            let port = &self.port;
            for ctx in 0..HWOS_CNTX_CNT {
                port.write(Reg::CntxType(ctx), CNTX_TYPE_TASK);
                port.write(Reg::CntxStat(ctx), OsCtxState::Stop as u32);
                port.write(Reg::InitAdd(ctx), 0);
                port.write(Reg::Prty(ctx), 0);
                port.write(Reg::InitR14(ctx), 0);
            }
            for i in 0..HWOS_SEM_CNT {
                port.write(Reg::SemTbl(i), 0);
            }
            for i in 0..HWOS_FLAG_CNT {
                port.write(Reg::FlgTbl(i), 0);
            }
            for i in 0..HWOS_Q_CNT {
                port.write(Reg::MbxTbl(i), 0);
            }
            port.write(Reg::Qint, 0);
            for n in 0..HWISR_PNTR_CNT {
                port.write(Reg::HwisrPntr(n), HWISR_PNTR_BASE + HWISR_PNTR_STEP * n as u32);
            }
        });

        let idle_ctx = critical_section(|cs| {
            let stk = self.idle_stk.get(cs);
            self.task_create_inner(
                &self.idle_tcb,
                "Idle",
                os_idle_task,
                ptr::null_mut(),
                CFG_PRIO_IDLE,
                stk,
                opt::TASK_NONE,
                true,
            )
        })?;

        critical_section(|cs| self.state.get(cs).idle_ctx = Some(idle_ctx));
        self.flags.set_initialized(true);

        crate::info!("kernel initialized, idle task on ctx {}", idle_ctx);
        Ok(())
    }

    /// Start multitasking
    ///
    /// Hands scheduling over to the hardware. The first task runs once the
    /// HW-RTOS raises its switch request.
    ///
    /// # Returns
    /// * `Ok(())` - Start command issued
    /// * `Err(OsError::OsNotInit)` - OS not initialized
    /// * `Err(OsError::OsRunning)` - OS is already running
    pub fn start(&self) -> OsResult<()> {
        if !self.is_initialized() {
            return Err(OsError::OsNotInit);
        }

        if self.is_running() {
            return Err(OsError::OsRunning);
        }

        critical_section(|_cs| {
            self.flags.set_running(true);
            self.port.write(Reg::Cmd, CMD_START);
        });

        crate::info!("kernel started");
        Ok(())
    }

    /// Program the hardware tick prescaler
    pub fn tick_init(&self, cnts: u32) {
        self.port.write(Reg::WtToPrescl, cnts);
    }

    // ============ Interrupts ============

    /// Enter ISR
    pub fn int_enter(&self) {
        self.flags.int_enter();
    }

    /// Exit ISR
    ///
    /// Leaving the outermost level performs the switch an ISR-path
    /// transaction left pending.
    pub fn int_exit(&self) {
        if !self.is_running() {
            return;
        }

        let _cs = CriticalSection::enter();

        if self.flags.int_nesting() == 0 {
            return;
        }

        if self.flags.int_nesting_dec() == 0 && self.flags.take_switch_pending() {
            self.port.task_switch();
        }
    }

    /// HW-RTOS interrupt: the hardware posted a response nobody polled for
    /// (timeouts, QINT actions, the first dispatch after start).
    pub fn on_hwos_interrupt(&self) {
        self.int_enter();

        critical_section(|cs| {
            let rsp = self.read_response("hwos_isr");
            if let Transaction::Completed(reply) = self.route(cs, rsp, "hwos_isr") {
                crate::warn!("hwos_isr: unaddressed response {:#x}", reply.code);
            }
        });

        self.int_exit();
    }

    // ============ Dispatcher ============

    /// Software half of the context switch
    ///
    /// Records `cur_sp` for the outgoing context (null on the very first
    /// switch) and returns the stack pointer of the context the hardware
    /// asked for.
    pub fn switch_context(&self, cur_sp: *mut OsStkElement) -> *mut OsStkElement {
        critical_section(|cs| {
            let st = self.state.get(cs);

            if st.ctx_cur < HWOS_CNTX_CNT && !cur_sp.is_null() {
                st.stk_ptr[st.ctx_cur] = cur_sp;
            }

            if st.pend_ctx_sw != HWOS_CNTX_NONE {
                st.ctx_cur = st.pend_ctx_sw;
                st.pend_ctx_sw = HWOS_CNTX_NONE;
            }

            st.stk_ptr[st.ctx_cur]
        })
    }
}
