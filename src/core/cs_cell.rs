//! Critical section protected cell
//!
//! Holds kernel state (slot tables, return slots, object bookkeeping) that
//! is only ever touched with interrupts masked.

use core::cell::UnsafeCell;
use crate::critical::CriticalSection;

/// A cell that can only be accessed within a critical section.
pub struct CsCell<T>(UnsafeCell<T>);

// SAFETY: access is serialized by the single-core critical section
unsafe impl<T> Sync for CsCell<T> {}

impl<T> CsCell<T> {
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Mutable access to the inner value.
    ///
    /// Callers must not hold two results of `get` on the same cell at once.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub fn get(&self, _cs: &CriticalSection) -> &mut T {
        unsafe { &mut *self.0.get() }
    }
}

impl<T: Copy> CsCell<T> {
    /// Copy the value out
    #[inline(always)]
    pub fn load(&self, cs: &CriticalSection) -> T {
        *self.get(cs)
    }

    /// Overwrite the value
    #[inline(always)]
    pub fn store(&self, cs: &CriticalSection, value: T) {
        *self.get(cs) = value;
    }
}
