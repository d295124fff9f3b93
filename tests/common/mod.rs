//! Simulated HW-RTOS for host tests
//!
//! `SimHwos` keeps a register file, logs every submitted command and answers
//! it either from a script or from a small model of the hardware objects,
//! so shadow-table read-backs behave like the real thing.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use ucosiii_hwrtos::hwos::engine::rsp;
use ucosiii_hwrtos::hwos::{
    HwosPort, Opcode, Reg, RESP_CTX_REQ, RESP_CTX_SHIFT, RESP_READY, SEM_TBL_CNT_MASK, SEM_TBL_COUNTING,
    SEM_TBL_MAX_SHIFT, SEM_TBL_VALID, SLEEP_FOREVER,
};
use ucosiii_hwrtos::{Kernel, OsCtxState, OsStkElement, OsTcb};

/// Depth of a simulated mailbox
pub const SIM_MBX_DEPTH: usize = 4;

/// One command as seen on `SYSC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issued {
    pub op: Opcode,
    pub args: [u32; 4],
}

#[derive(Default)]
struct Sim {
    regs: HashMap<usize, u32>,
    log: Vec<Issued>,
    script: VecDeque<(u32, u32)>,
    mbx: HashMap<u32, VecDeque<u32>>,
}

impl Sim {
    fn reg(&self, reg: Reg) -> u32 {
        self.regs.get(&reg.offset()).copied().unwrap_or(0)
    }

    fn set(&mut self, reg: Reg, val: u32) {
        self.regs.insert(reg.offset(), val);
    }

    fn args(&self) -> [u32; 4] {
        [self.reg(Reg::R4), self.reg(Reg::R5), self.reg(Reg::R6), self.reg(Reg::R7)]
    }

    /// Behavioral answer to `cmd`: (code, r1)
    fn execute(&mut self, cmd: Issued) -> (u16, u32) {
        let [r4, r5, r6, r7] = cmd.args;
        let id = (r4 & 0xFFFF) as usize;
        match cmd.op {
            // ============ Semaphores ============
            Opcode::CreSem => {
                let tbl = self.reg(Reg::SemTbl(id));
                let max = (tbl >> SEM_TBL_MAX_SHIFT) & 0x1F;
                if r5 > max {
                    return (rsp::INVALID_OR_ABORTED, 0);
                }
                self.set(Reg::SemTbl(id), (tbl & !SEM_TBL_CNT_MASK) | r5 << 1);
                (rsp::OK, 0)
            }
            Opcode::WaiSem => {
                let tbl = self.reg(Reg::SemTbl(id));
                let cnt = (tbl & SEM_TBL_CNT_MASK) >> 1;
                if cnt > 0 {
                    self.set(Reg::SemTbl(id), (tbl & !SEM_TBL_CNT_MASK) | (cnt - 1) << 1);
                    (rsp::OK, 0)
                } else if r5 == 0 {
                    (rsp::POLL_FAIL, 0)
                } else {
                    (rsp::TIMEOUT, 0)
                }
            }
            Opcode::SigSem => {
                let tbl = self.reg(Reg::SemTbl(id));
                let cnt = (tbl & SEM_TBL_CNT_MASK) >> 1;
                let max = if tbl & SEM_TBL_COUNTING != 0 { (tbl >> SEM_TBL_MAX_SHIFT) & 0x1F } else { 1 };
                if cnt >= max {
                    return (rsp::OVERFLOW, 0);
                }
                self.set(Reg::SemTbl(id), (tbl & !SEM_TBL_CNT_MASK) | (cnt + 1) << 1);
                (rsp::OK, 0)
            }
            Opcode::DelSem => {
                if self.reg(Reg::SemTbl(id)) & SEM_TBL_VALID == 0 {
                    return (rsp::NO_OBJECT, 0);
                }
                self.set(Reg::SemTbl(id), 0);
                (rsp::OK, 0)
            }

            // ============ Event flags ============
            Opcode::CreG => {
                self.set(Reg::FlgTbl(id), 1);
                (rsp::OK, 0)
            }
            Opcode::SetG | Opcode::ClrG => {
                let tbl = self.reg(Reg::FlgTbl(id));
                let flags = (tbl >> 1) & 0xFFFF;
                let flags = if cmd.op == Opcode::SetG { flags | r5 } else { flags & !r5 };
                self.set(Reg::FlgTbl(id), (tbl & 1) | flags << 1);
                (rsp::OK, 0)
            }
            Opcode::WaiG => {
                let tbl = self.reg(Reg::FlgTbl(id));
                let flags = (tbl >> 1) & 0xFFFF;
                let ready = if r6 & 0x2 != 0 { flags & r7 == r7 } else { flags & r7 != 0 };
                if ready {
                    if r6 & 0x1 != 0 {
                        self.set(Reg::FlgTbl(id), (tbl & 1) | (flags & !r7) << 1);
                    }
                    (rsp::OK, flags & r7)
                } else if r5 == 0 {
                    (rsp::POLL_FAIL, 0)
                } else {
                    (rsp::TIMEOUT, 0)
                }
            }
            Opcode::DelG => {
                if self.reg(Reg::FlgTbl(id)) & 1 == 0 {
                    return (rsp::NO_OBJECT, 0);
                }
                self.set(Reg::FlgTbl(id), 0);
                (rsp::OK, 0)
            }

            // ============ Mailboxes ============
            Opcode::CreMbx => {
                self.mbx.insert(r4, VecDeque::new());
                (rsp::OK, 0)
            }
            Opcode::SndMbx => match self.mbx.get_mut(&r4) {
                Some(q) if q.len() >= SIM_MBX_DEPTH => (rsp::MBX_FULL, 0),
                Some(q) => {
                    q.push_back(r5);
                    (rsp::OK, 0)
                }
                None => (rsp::NO_OBJECT, 0),
            },
            Opcode::RcvMbx => match self.mbx.get_mut(&r4).and_then(VecDeque::pop_front) {
                Some(msg) => (rsp::OK, msg),
                None if r5 == 0 => (rsp::POLL_FAIL, 0),
                None => (rsp::TIMEOUT, 0),
            },
            Opcode::DelMbx => {
                self.mbx.remove(&r4);
                (rsp::OK, 0)
            }

            // ============ Tasks ============
            Opcode::ChgPri => {
                self.set(Reg::Prty(id), r5 | r5 << 8);
                (rsp::OK, 0)
            }
            Opcode::StaTsk => {
                self.set(Reg::CntxStat(id), OsCtxState::Ready as u32);
                (rsp::OK, 0)
            }
            Opcode::TerTsk | Opcode::ExtTsk => {
                self.set(Reg::CntxStat(id), OsCtxState::Stop as u32);
                (rsp::OK, 0)
            }
            Opcode::SlpTsk if r5 == SLEEP_FOREVER => (rsp::WOKEN, 0),
            Opcode::SlpTsk => (rsp::TIMEOUT, 0),
            Opcode::WupTsk | Opcode::RelWai => {
                if self.reg(Reg::CntxStat(id)) != OsCtxState::Wait as u32 {
                    return (rsp::NOT_WAITING_C, 0);
                }
                self.set(Reg::CntxStat(id), OsCtxState::Ready as u32);
                (rsp::OK, 0)
            }

            _ => (rsp::INVALID_CALL, 0),
        }
    }
}

/// Software double of the HW-RTOS register block
#[derive(Default)]
pub struct SimHwos {
    sim: RefCell<Sim>,
    switches: Cell<u32>,
}

impl SimHwos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next command with `code` instead of the model
    pub fn script(&self, code: u16) {
        self.script_raw(RESP_READY | code as u32, 0);
    }

    /// Answer the next command with `code` and payload `r1`
    pub fn script_value(&self, code: u16, r1: u32) {
        self.script_raw(RESP_READY | code as u32, r1);
    }

    /// Answer the next command with a switch request to `ctx`
    pub fn script_switch(&self, ctx: usize, code: u16) {
        self.script_raw(RESP_READY | RESP_CTX_REQ | (ctx as u32) << RESP_CTX_SHIFT | code as u32, 0);
    }

    pub fn script_raw(&self, r0: u32, r1: u32) {
        self.sim.borrow_mut().script.push_back((r0, r1));
    }

    /// Every command submitted so far
    pub fn log(&self) -> Vec<Issued> {
        self.sim.borrow().log.clone()
    }

    /// Opcodes submitted so far
    pub fn ops(&self) -> Vec<Opcode> {
        self.sim.borrow().log.iter().map(|c| c.op).collect()
    }

    pub fn last(&self) -> Option<Issued> {
        self.sim.borrow().log.last().copied()
    }

    pub fn clear_log(&self) {
        self.sim.borrow_mut().log.clear();
    }

    /// Times the dispatcher was pended
    pub fn switches(&self) -> u32 {
        self.switches.get()
    }

    /// Register value, without going through the port
    pub fn peek(&self, reg: Reg) -> u32 {
        self.sim.borrow().reg(reg)
    }

    /// Messages waiting in a simulated mailbox
    pub fn mbx_len(&self, id: usize) -> usize {
        self.sim.borrow().mbx.get(&(id as u32)).map_or(0, VecDeque::len)
    }
}

impl HwosPort for SimHwos {
    fn read(&self, reg: Reg) -> u32 {
        self.sim.borrow().reg(reg)
    }

    fn write(&self, reg: Reg, val: u32) {
        let mut sim = self.sim.borrow_mut();
        if reg != Reg::Sysc {
            sim.set(reg, val);
            return;
        }

        let op = Opcode::from_raw(val).expect("unknown opcode written to SYSC");
        let cmd = Issued { op, args: sim.args() };
        sim.log.push(cmd);

        let (r0, r1) = match sim.script.pop_front() {
            Some(scripted) => scripted,
            None => {
                let (code, r1) = sim.execute(cmd);
                (RESP_READY | code as u32, r1)
            }
        };
        sim.set(Reg::R0, r0);
        sim.set(Reg::R1, r1);
    }

    fn task_switch(&self) {
        self.switches.set(self.switches.get() + 1);
    }
}

// ============ Fixtures ============

pub fn kernel() -> &'static Kernel<SimHwos> {
    Box::leak(Box::new(Kernel::new(SimHwos::new())))
}

/// Initialized kernel; the idle task holds context 0
pub fn init_kernel() -> &'static Kernel<SimHwos> {
    let k = kernel();
    k.init().expect("init");
    k.port().clear_log();
    k
}

/// Initialized and started kernel
pub fn started_kernel() -> &'static Kernel<SimHwos> {
    let k = init_kernel();
    k.start().expect("start");
    k
}

pub fn tcb() -> &'static OsTcb {
    Box::leak(Box::new(OsTcb::new()))
}

pub fn stack(words: usize) -> &'static mut [OsStkElement] {
    Box::leak(vec![0; words].into_boxed_slice())
}

pub fn task_body(_: *mut ()) -> ! {
    loop {
        std::hint::spin_loop();
    }
}

/// Create a task and return its TCB and context
pub fn spawn(k: &Kernel<SimHwos>, prio: u8) -> (&'static OsTcb, usize) {
    let t = tcb();
    let ctx = k
        .task_create(t, "t", task_body, std::ptr::null_mut(), prio, stack(128), 0)
        .expect("task_create");
    (t, ctx)
}

/// Make `ctx` the running context: the hardware raises a switch request
/// without a reply and the dispatcher takes it
pub fn run(k: &Kernel<SimHwos>, ctx: usize) {
    k.port().write(Reg::R0, RESP_READY | RESP_CTX_REQ | (ctx as u32) << RESP_CTX_SHIFT);
    k.port().write(Reg::R1, 0);
    k.on_hwos_interrupt();
    k.switch_context(std::ptr::null_mut());
}
