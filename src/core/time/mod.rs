//! Time management module
//!
//! Delays are hardware sleeps: the HW-RTOS keeps the system time and wakes
//! the task when its delay runs out. This module only converts the
//! μC/OS-III delay forms into a relative tick count.

use crate::config::CFG_TICK_RATE_HZ;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::engine::Command;
use crate::hwos::outcome::{SleepOutcome, WakeOutcome};
use crate::hwos::{HwosPort, Opcode, Reg};
use crate::kernel::Kernel;
use crate::task::OsTcb;
use crate::types::{opt, OsOpt, OsTick};

/// Largest relative delay a MATCH target may resolve to; anything above it
/// is a target already in the past
pub const TICK_TH_RDY: OsTick = 0xFFFF_0000;

/// Longest delay a sleep can request; all ones means "forever"
const TICKS_MAX: u64 = 0xFFFF_FFFE;

/// Convert an hours/minutes/seconds/milliseconds delay to ticks, rounded to
/// the nearest tick
pub fn hmsm_to_ticks(hours: u16, minutes: u16, seconds: u16, milli: u32, tick_rate: u32) -> OsTick {
    let rate = tick_rate as u64;
    let secs = hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64;
    let ticks = secs * rate + rate * (milli as u64 + 500 / rate) / 1000;
    ticks.min(TICKS_MAX) as OsTick
}

impl<P: HwosPort> Kernel<P> {
    /// Time delay in ticks
    ///
    /// # Arguments
    /// * `dly` - Ticks to wait, or the absolute system time for `TIME_MATCH`
    /// * `opt` - One of `TIME_DLY`, `TIME_TIMEOUT`, `TIME_MATCH`, `TIME_PERIODIC`
    ///
    /// # Returns
    /// * `Ok(())` - Delay elapsed or the task was woken early
    /// * `Err(OsError::TimeDlyIsr)` - Cannot delay from ISR
    /// * `Err(OsError::TimeZeroDly)` - Nothing to wait for
    /// * `Err(OsError::HwosUnsupported)` - Periodic delays
    /// * `Err(OsError::OptInvalid)` - Unknown option
    pub fn time_dly(&self, dly: OsTick, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TimeDlyIsr);
        }

        match opt {
            opt::TIME_DLY | opt::TIME_TIMEOUT => {
                if dly == 0 {
                    return Err(OsError::TimeZeroDly);
                }
            }
            opt::TIME_MATCH => {}
            opt::TIME_PERIODIC => return Err(OsError::HwosUnsupported),
            _ => return Err(OsError::OptInvalid),
        }

        critical_section(|cs| -> OsResult<()> {
            let mut ticks = dly;
            if opt == opt::TIME_MATCH {
                ticks = dly.wrapping_sub(self.port.read(Reg::SysTim));
                if ticks > TICK_TH_RDY || ticks == 0 {
                    return Err(OsError::TimeZeroDly);
                }
            }

            self.submit_task(cs, &Command::new(Opcode::SlpTsk).r5(ticks));
            Ok(())
        })?;

        let reply = self.take_reply("time_dly");
        SleepOutcome::decode(reply.code).into_result("time_dly")
    }

    /// Time delay in hours, minutes, seconds, milliseconds
    ///
    /// # Arguments
    /// * `hours` - Hours (0-99, or 0-999 with `TIME_HMSM_NON_STRICT`)
    /// * `minutes` - Minutes (0-59, or 0-9999 with `TIME_HMSM_NON_STRICT`)
    /// * `seconds` - Seconds (0-59, unbounded with `TIME_HMSM_NON_STRICT`)
    /// * `milli` - Milliseconds (0-999, unbounded with `TIME_HMSM_NON_STRICT`)
    /// * `opt` - `TIME_DLY` or `TIME_TIMEOUT`, optionally with `TIME_HMSM_NON_STRICT`
    pub fn time_dly_hmsm(&self, hours: u16, minutes: u16, seconds: u16, milli: u32, opt: OsOpt) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TimeDlyIsr);
        }

        match opt & opt::TIME_MASK {
            opt::TIME_DLY | opt::TIME_TIMEOUT => {
                if hours == 0 && minutes == 0 && seconds == 0 && milli == 0 {
                    return Err(OsError::TimeZeroDly);
                }
            }
            opt::TIME_MATCH | opt::TIME_PERIODIC => return Err(OsError::HwosUnsupported),
            _ => return Err(OsError::OptInvalid),
        }

        if opt & !opt::TIME_OPTS_MASK != 0 {
            return Err(OsError::OptInvalid);
        }

        if opt & opt::TIME_HMSM_NON_STRICT == 0 {
            if milli > 999 {
                return Err(OsError::TimeInvalidMilliseconds);
            }
            if seconds > 59 {
                return Err(OsError::TimeInvalidSeconds);
            }
            if minutes > 59 {
                return Err(OsError::TimeInvalidMinutes);
            }
            if hours > 99 {
                return Err(OsError::TimeInvalidHours);
            }
        } else {
            if minutes > 9999 {
                return Err(OsError::TimeInvalidMinutes);
            }
            if hours > 999 {
                return Err(OsError::TimeInvalidHours);
            }
        }

        let ticks = hmsm_to_ticks(hours, minutes, seconds, milli, CFG_TICK_RATE_HZ);
        if ticks == 0 {
            return Err(OsError::TimeZeroDly);
        }

        let reply = self.call(&Command::new(Opcode::SlpTsk).r5(ticks));
        SleepOutcome::decode(reply.code).into_result("time_dly_hmsm")
    }

    /// Wake a task that is waiting in a delay
    ///
    /// # Returns
    /// * `Ok(())` - Task released
    /// * `Err(OsError::TimeDlyResumeIsr)` - Called from an ISR
    /// * `Err(OsError::TaskNotDly)` - `tcb` is the caller or is not delayed
    /// * `Err(OsError::ObjType)` - `tcb` holds no task
    pub fn time_dly_resume(&self, tcb: &OsTcb) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::TimeDlyResumeIsr);
        }

        if tcb.ctx_id().is_some() && tcb.ctx_id() == self.ctx_cur() {
            return Err(OsError::TaskNotDly);
        }

        let ctx = tcb.check()?;

        let reply = self.call(&Command::new(Opcode::RelWai).r4(ctx as u32));
        WakeOutcome::decode(reply.code).into_result(OsError::TaskNotDly, "time_dly_resume")
    }

    /// Current HW-RTOS system time in ticks
    #[inline]
    pub fn time_get(&self) -> OsTick {
        self.port.read(Reg::SysTim)
    }

    /// Overwrite the HW-RTOS system time
    #[inline]
    pub fn time_set(&self, ticks: OsTick) {
        self.port.write(Reg::SysTim, ticks);
    }
}
