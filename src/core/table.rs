//! Hardware slot tables
//!
//! The HW-RTOS has a fixed number of contexts, semaphores, flag groups and
//! mailboxes. Each kind gets a [`ResourceTable`] mapping slot ids to the
//! software object that owns them. Allocation is first-fit from index 0, so
//! the id an object receives is deterministic.
//!
//! Tables live inside the kernel's critical-section cell; every allocate or
//! release happens in the same critical section as the hardware command that
//! creates or destroys the object.

use core::ptr::NonNull;

use crate::config::{HWOS_CNTX_CNT, HWOS_FLAG_CNT, HWOS_Q_CNT, HWOS_SEM_CNT};
use crate::error::{OsError, OsResult};
use crate::types::OsSlotId;

/// Back-reference from a slot to the object that owns it.
///
/// Mostly an identity token. Task context slots are the exception: their
/// owners are `'static` TCBs, so a task deleted by context id can be
/// reached through its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef(NonNull<()>);

// SAFETY: only dereferenced through `as_ref`, whose callers guarantee the
// target outlives the reference
unsafe impl Send for ObjRef {}

impl ObjRef {
    #[inline]
    pub fn of<T>(obj: &T) -> Self {
        ObjRef(NonNull::from(obj).cast())
    }

    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }

    /// # Safety
    /// The owner must be a live `T`.
    #[inline]
    pub(crate) unsafe fn as_ref<'a, T>(self) -> &'a T {
        // SAFETY: upheld by the caller
        unsafe { self.0.cast::<T>().as_ref() }
    }
}

/// Fixed-capacity slot table
pub struct ResourceTable<const N: usize> {
    slots: [Option<ObjRef>; N],
}

/// Task context slots
pub type CtxTable = ResourceTable<HWOS_CNTX_CNT>;
/// Semaphore slots, shared by semaphores and mutexes
pub type SemTable = ResourceTable<HWOS_SEM_CNT>;
/// Event flag group slots
pub type FlagTable = ResourceTable<HWOS_FLAG_CNT>;
/// Mailbox slots backing message queues
pub type MbxTable = ResourceTable<HWOS_Q_CNT>;

impl<const N: usize> ResourceTable<N> {
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claim the lowest free slot for `owner`
    ///
    /// # Returns
    /// * `Ok(id)` - Slot now owned by `owner`
    /// * `Err(OsError::HwosRsrcNotAvail)` - Every slot is in use
    pub fn allocate(&mut self, owner: ObjRef) -> OsResult<OsSlotId> {
        let id = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(OsError::HwosRsrcNotAvail)?;
        self.slots[id] = Some(owner);
        Ok(id)
    }

    /// Return a slot to the free pool, yielding its previous owner
    pub fn release(&mut self, id: OsSlotId) -> Option<ObjRef> {
        self.slots.get_mut(id).and_then(Option::take)
    }

    pub fn lookup(&self, id: OsSlotId) -> Option<ObjRef> {
        self.slots.get(id).copied().flatten()
    }

    pub fn is_free(&self, id: OsSlotId) -> bool {
        self.lookup(id).is_none()
    }

    /// Slot currently owned by `owner`, if any
    pub fn find(&self, owner: ObjRef) -> Option<OsSlotId> {
        self.slots.iter().position(|s| *s == Some(owner))
    }

    /// Number of slots in use
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots = [None; N];
    }
}

impl<const N: usize> Default for ResourceTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
