//! Initial task stack image
//!
//! A new task starts through the same exception return as a preempted one,
//! so its stack is laid out as if it had been switched out: the hardware
//! exception frame on top, the callee-saved registers below it.

use crate::task::OsTaskFn;
use crate::types::OsStkElement;

/// Words in a saved context: R4-R11 plus the 8-word exception frame
pub const STK_FRAME_WORDS: usize = 16;

/// Thumb state bit of xPSR
const XPSR_THUMB: u32 = 0x0100_0000;

/// Lay out the first context of a task at the top of `stack`.
///
/// `stack` must hold at least [`STK_FRAME_WORDS`] elements. Returns the
/// stack pointer the dispatcher restores from.
pub fn task_stk_init(task_fn: OsTaskFn, arg: *mut (), stack: &mut [OsStkElement]) -> *mut OsStkElement {
    let frame: [OsStkElement; STK_FRAME_WORDS] = [
        // Saved by the dispatcher
        0x0404_0404, // R4
        0x0505_0505, // R5
        0x0606_0606, // R6
        0x0707_0707, // R7
        0x0808_0808, // R8
        0x0909_0909, // R9
        0x1010_1010, // R10
        0x1111_1111, // R11
        // Stacked by the exception entry
        arg as usize as u32,         // R0
        0,                           // R1
        0x0202_0202,                 // R2
        0x0303_0303,                 // R3
        0x1212_1212,                 // R12
        0,                           // LR, tasks never return
        task_fn as usize as u32 | 1, // PC
        XPSR_THUMB,                  // xPSR
    ];

    let base = stack.len() - STK_FRAME_WORDS;
    let top = &mut stack[base..];
    top.copy_from_slice(&frame);
    top.as_mut_ptr()
}
