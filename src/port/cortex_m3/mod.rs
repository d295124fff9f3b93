//! Cortex-M3 port for the R-IN32M3 HW-RTOS
//!
//! Provides the MMIO [`HwosPort`], the global kernel instance, the PendSV
//! dispatcher and the handler of the HW-RTOS interrupt.

use core::arch::naked_asm;
use core::ptr;

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::SCB;

use crate::config::HWOS_BASE;
use crate::error::OsResult;
use crate::hwos::{HwosPort, Reg};
use crate::kernel::Kernel;
use crate::types::OsStkElement;

/// HW-RTOS response interrupt line
const HWOS_IRQ: u16 = 92;

/// Priority bits implemented by the R-IN32M3 NVIC
const NVIC_PRIO_BITS: u8 = 4;

/// Priority of the HW-RTOS interrupt, just above the dispatcher
const HWOS_IRQ_PRIO: u8 = 14;

/// The dispatcher runs last
const PENDSV_PRIO: u8 = 15;

/// Memory-mapped HW-RTOS register block
pub struct Rin32Hwos {
    base: usize,
}

impl Rin32Hwos {
    pub const fn new() -> Self {
        Self { base: HWOS_BASE }
    }

    #[inline(always)]
    fn addr(&self, reg: Reg) -> *mut u32 {
        (self.base + reg.offset()) as *mut u32
    }
}

impl Default for Rin32Hwos {
    fn default() -> Self {
        Self::new()
    }
}

impl HwosPort for Rin32Hwos {
    #[inline(always)]
    fn read(&self, reg: Reg) -> u32 {
        // SAFETY: every `Reg` lies inside the HW-RTOS register block
        unsafe { ptr::read_volatile(self.addr(reg)) }
    }

    #[inline(always)]
    fn write(&self, reg: Reg, val: u32) {
        // SAFETY: every `Reg` lies inside the HW-RTOS register block
        unsafe { ptr::write_volatile(self.addr(reg), val) }
    }

    #[inline(always)]
    fn task_switch(&self) {
        SCB::set_pendsv();
    }

    #[inline(always)]
    fn task_sync(&self) {
        cortex_m::asm::isb();
    }
}

/// The kernel instance
pub static OS: Kernel<Rin32Hwos> = Kernel::new(Rin32Hwos::new());

#[derive(Clone, Copy)]
struct HwosIrq;

// SAFETY: 92 is a valid R-IN32M3 interrupt number
unsafe impl InterruptNumber for HwosIrq {
    fn number(self) -> u16 {
        HWOS_IRQ
    }
}

/// Enable the HW-RTOS interrupt and set the dispatcher priority
pub fn os_cpu_init() {
    // SAFETY: runs once before scheduling starts
    let mut p = unsafe { cortex_m::Peripherals::steal() };
    let shift = 8 - NVIC_PRIO_BITS;

    unsafe {
        p.NVIC.set_priority(HwosIrq, HWOS_IRQ_PRIO << shift);
        p.SCB.set_priority(SystemHandler::PendSV, PENDSV_PRIO << shift);
        cortex_m::peripheral::NVIC::unmask(HwosIrq);
    }
}

/// Hand the CPU over to the HW-RTOS
///
/// Only returns on error; otherwise the first context switch leaves the
/// startup stack for good.
pub fn os_start() -> OsResult<()> {
    os_cpu_init();

    // SAFETY: a zero PSP marks "no outgoing context" for the dispatcher
    unsafe {
        cortex_m::register::psp::write(0);
    }

    OS.start()?;

    // SAFETY: the kernel is initialized and started
    unsafe { cortex_m::interrupt::enable() };
    loop {
        cortex_m::asm::wfi();
    }
}

/// Called from PendSV with the outgoing PSP, returns the incoming one
#[no_mangle]
extern "C" fn hwos_switch_context(cur_sp: *mut OsStkElement) -> *mut OsStkElement {
    OS.switch_context(cur_sp)
}

/// PendSV exception handler - performs the context switch
///
/// 1. Save R4-R11 on the outgoing PSP (skipped on the first switch)
/// 2. Let the kernel pick the context the HW-RTOS asked for
/// 3. Restore R4-R11 from the incoming stack and return to thread mode on PSP
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "cpsid i",
        "mrs r0, psp",
        "cbz r0, 1f",
        "stmdb r0!, {{r4-r11}}",
        "1:",
        "bl {switch}",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "ldr lr, =0xFFFFFFFD",
        "cpsie i",
        "dsb",
        "isb",
        "bx lr",
        switch = sym hwos_switch_context,
    );
}

// The vector table comes from cortex-m-rt without a device crate, so the
// HW-RTOS line is picked out of the default handler
#[cortex_m_rt::exception]
unsafe fn DefaultHandler(irqn: i16) {
    if irqn == HWOS_IRQ as i16 {
        OS.on_hwos_interrupt();
    }
}
