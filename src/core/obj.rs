//! Kernel object header
//!
//! Every user-allocated kernel object (semaphore, mutex, flag group, queue,
//! memory partition, TCB) embeds an [`ObjHeader`]. The header carries the
//! type tag used to catch a handle passed to the wrong API and the hardware
//! slot the object was given at creation. A handle is invalid (type `None`)
//! until created and becomes invalid again once deleted.

use portable_atomic::{AtomicU32, AtomicUsize, Ordering};

#[cfg(feature = "defmt")]
use crate::core::cs_cell::CsCell;
use crate::critical::CriticalSection;
use crate::error::{OsError, OsResult};
use crate::types::{OsObjType, OsSlotId};

pub struct ObjHeader {
    ty: AtomicU32,
    slot: AtomicUsize,
    #[cfg(feature = "defmt")]
    name: CsCell<&'static str>,
}

impl ObjHeader {
    pub const fn new() -> Self {
        Self {
            ty: AtomicU32::new(OsObjType::None as u32),
            slot: AtomicUsize::new(0),
            #[cfg(feature = "defmt")]
            name: CsCell::new(""),
        }
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        OsObjType::from_raw(self.ty.load(Ordering::Acquire))
    }

    /// Hardware slot assigned at creation; meaningless while invalid
    #[inline]
    pub fn slot(&self) -> OsSlotId {
        self.slot.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        self.obj_type() != OsObjType::None
    }

    /// Slot of a live object of type `ty`
    #[inline]
    pub fn check(&self, ty: OsObjType) -> OsResult<OsSlotId> {
        if self.obj_type() != ty {
            return Err(OsError::ObjType);
        }
        Ok(self.slot())
    }

    pub(crate) fn open(&self, cs: &CriticalSection, ty: OsObjType, slot: OsSlotId, name: &'static str) {
        self.slot.store(slot, Ordering::Release);
        self.ty.store(ty as u32, Ordering::Release);
        #[cfg(feature = "defmt")]
        self.name.store(cs, name);
        #[cfg(not(feature = "defmt"))]
        let _ = (cs, name);
    }

    pub(crate) fn close(&self, _cs: &CriticalSection) {
        self.ty.store(OsObjType::None as u32, Ordering::Release);
    }

    /// Display name given at creation
    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        crate::critical::critical_section(|cs| self.name.load(cs))
    }
}

impl Default for ObjHeader {
    fn default() -> Self {
        Self::new()
    }
}
