//! Command protocol engine
//!
//! One transaction is: write the argument registers, write the opcode to
//! `SYSC`, poll `R0` until the ready bit is set, read `R1`. The response
//! either answers the caller directly or asks for a context switch, in
//! which case the reply (if any) belongs to the context being switched to
//! and is parked in that context's return slot.
//!
//! Callers run the submit step inside a critical section. What happens to
//! the result afterwards depends on where the caller runs:
//!
//! - task path: the reply is always read from the caller's return slot once
//!   the hardware has resumed it ([`Kernel::take_reply`])
//! - ISR path: a direct reply is used as is; a switch request is recorded
//!   and acted upon by the interrupt epilogue ([`Kernel::int_exit`])

use core::hint::spin_loop;

use crate::config::CFG_RESP_SPIN_MAX;
use crate::core::kernel::Kernel;
use crate::critical::{critical_section, CriticalSection};
use crate::error::{fatal, lost};
use crate::types::OsCtxId;

use super::opcode::Opcode;
use super::reg::Reg;
use super::{HwosPort, RESP_CODE_MASK, RESP_CTX_MASK, RESP_CTX_REQ, RESP_CTX_SHIFT, RESP_READY};

/// Raw HW-RTOS result codes
pub mod rsp {
    pub const OK: u16 = 0x0001;
    /// Priority changed and the task was requeued
    pub const OK_REQUEUED: u16 = 0x0002;
    /// Acquired after waiting
    pub const OK_WAITED: u16 = 0x0003;
    /// Nothing available for a zero-timeout wait
    pub const POLL_FAIL: u16 = 0x0004;
    /// Mailbox full
    pub const MBX_FULL: u16 = 0x0084;

    pub const INVALID_CALL: u16 = 0xFF80;
    pub const EXISTS: u16 = 0xFF83;
    /// Invalid count on create, wait aborted on pend
    pub const INVALID_OR_ABORTED: u16 = 0xFF84;
    /// Object already deleted or of the wrong kind
    pub const NO_OBJECT: u16 = 0xFF85;
    pub const TIMEOUT: u16 = 0xFF86;
    pub const NOT_OWNER: u16 = 0xFF87;
    pub const NOT_WAITING_B: u16 = 0xFF8B;
    pub const NOT_WAITING_C: u16 = 0xFF8C;
    /// Sleep ended by a wakeup
    pub const WOKEN: u16 = 0xFF8D;
    pub const NOT_WAITING_E: u16 = 0xFF8E;
    /// Semaphore overflow, or mutex released without an owner
    pub const OVERFLOW: u16 = 0xFF8F;
    /// Wait ended by a release-wait
    pub const RELEASED: u16 = 0xFF90;
    pub const FLAG_DELETED: u16 = 0xFF92;
    pub const SEM_DELETED: u16 = 0xFF93;
    pub const MBX_DELETED: u16 = 0xFF94;
}

/// A system call ready to be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    op: Opcode,
    args: [Option<u32>; 4],
}

impl Command {
    pub fn new(op: Opcode) -> Self {
        Self { op, args: [None; 4] }
    }

    pub fn r4(mut self, val: u32) -> Self {
        self.args[0] = Some(val);
        self
    }

    pub fn r5(mut self, val: u32) -> Self {
        self.args[1] = Some(val);
        self
    }

    pub fn r6(mut self, val: u32) -> Self {
        self.args[2] = Some(val);
        self
    }

    pub fn r7(mut self, val: u32) -> Self {
        self.args[3] = Some(val);
        self
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.op
    }

    /// Argument words for `R4`..`R7`; unset registers are left untouched
    #[inline]
    pub fn args(&self) -> [Option<u32>; 4] {
        self.args
    }
}

/// `R0`/`R1` as read back after the ready bit was seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub r0: u32,
    pub r1: u32,
}

impl Response {
    #[inline]
    pub const fn code(&self) -> u16 {
        (self.r0 & RESP_CODE_MASK) as u16
    }

    /// Context the hardware wants to run next, if this is a switch request
    #[inline]
    pub const fn switch_request(&self) -> Option<OsCtxId> {
        if self.r0 & RESP_CTX_REQ != 0 {
            Some(((self.r0 & RESP_CTX_MASK) >> RESP_CTX_SHIFT) as OsCtxId)
        } else {
            None
        }
    }

    #[inline]
    pub const fn reply(&self) -> Reply {
        Reply { code: self.code(), value: self.r1 }
    }
}

/// Result code and payload delivered to one context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
pub struct Reply {
    pub code: u16,
    pub value: u32,
}

impl Reply {
    pub const OK: Reply = Reply { code: rsp::OK, value: 0 };
}

/// Outcome of the submit step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    /// The hardware answered the caller directly
    Completed(Reply),
    /// The hardware asked to switch to this context; any reply it carried
    /// was parked in that context's return slot
    Deferred(OsCtxId),
}

/// Post-style calls may run on either path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostReply {
    Now(Reply),
    /// Read the return slot once this task runs again
    Later,
}

impl<P: HwosPort> Kernel<P> {
    // ============ Submit ============

    /// Submit `cmd` and route the response.
    ///
    /// Must be called with interrupts masked; the critical section is the
    /// only thing keeping another transaction from interleaving its register
    /// writes with this one.
    pub fn submit(&self, cs: &CriticalSection, cmd: &Command) -> Transaction {
        let op = cmd.opcode();
        crate::trace!("hwos: {} r4..r7={:?}", op.name(), cmd.args());

        for (reg, arg) in [Reg::R4, Reg::R5, Reg::R6, Reg::R7].into_iter().zip(cmd.args()) {
            if let Some(val) = arg {
                self.port.write(reg, val);
            }
        }
        self.port.write(Reg::Sysc, op.raw());

        let rsp = self.read_response(op.name());
        self.route(cs, rsp, op.name())
    }

    /// Task path: a direct reply goes to the caller's own return slot so
    /// that [`take_reply`](Self::take_reply) finds it either way.
    pub(crate) fn submit_task(&self, cs: &CriticalSection, cmd: &Command) {
        if let Transaction::Completed(reply) = self.submit(cs, cmd) {
            let st = self.state.get(cs);
            let cur = st.ctx_cur;
            st.task_ret[cur] = Some(reply);
        }
    }

    /// Dual path used by post-style calls
    pub(crate) fn submit_post(&self, cs: &CriticalSection, cmd: &Command) -> PostReply {
        match self.submit(cs, cmd) {
            Transaction::Completed(reply) => PostReply::Now(reply),
            // The interrupted task keeps running; the switch happens at ISR exit
            Transaction::Deferred(_) if self.in_isr() => PostReply::Now(Reply::OK),
            Transaction::Deferred(_) => PostReply::Later,
        }
    }

    /// Run one task-path transaction and wait for its reply
    pub(crate) fn call(&self, cmd: &Command) -> Reply {
        critical_section(|cs| self.submit_task(cs, cmd));
        self.take_reply(cmd.opcode().name())
    }

    // ============ Replies ============

    /// Consume the reply parked for the current context.
    ///
    /// Called outside the critical section, after the hardware has resumed
    /// the caller. A missing reply means the protocol lost track of this
    /// context, which is fatal.
    pub(crate) fn take_reply(&self, site: &'static str) -> Reply {
        self.port.task_sync();
        critical_section(|cs| {
            let st = self.state.get(cs);
            let cur = st.ctx_cur;
            st.task_ret[cur].take()
        })
        .unwrap_or_else(|| lost(site))
    }

    pub(crate) fn post_reply(&self, post: PostReply, site: &'static str) -> Reply {
        match post {
            PostReply::Now(reply) => reply,
            PostReply::Later => self.take_reply(site),
        }
    }

    // ============ Response handling ============

    /// Poll the ready bit, bounded by `CFG_RESP_SPIN_MAX`
    pub(crate) fn read_response(&self, site: &'static str) -> Response {
        let mut spins = 0u32;
        let r0 = loop {
            let r0 = self.port.read(Reg::R0);
            if r0 & RESP_READY != 0 {
                break r0;
            }
            spins += 1;
            if spins >= CFG_RESP_SPIN_MAX {
                lost(site);
            }
            spin_loop();
        };
        Response { r0, r1: self.port.read(Reg::R1) }
    }

    pub(crate) fn route(&self, cs: &CriticalSection, rsp: Response, site: &'static str) -> Transaction {
        let Some(ctx) = rsp.switch_request() else {
            return Transaction::Completed(rsp.reply());
        };

        let st = self.state.get(cs);
        if ctx >= st.task_ret.len() {
            fatal(site, rsp.code());
        }
        st.pend_ctx_sw = ctx;
        if rsp.code() != 0 {
            st.task_ret[ctx] = Some(rsp.reply());
        }
        crate::trace!("hwos: switch to ctx {} requested", ctx);

        self.request_switch();
        Transaction::Deferred(ctx)
    }

    /// Pend the dispatcher now, or leave it to the outermost interrupt exit
    fn request_switch(&self) {
        if self.in_isr() {
            self.flags.set_switch_pending();
        } else {
            self.port.task_switch();
        }
    }
}
