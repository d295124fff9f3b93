//! Fixed-size memory partitions
//!
//! A partition carves caller-supplied storage into equal blocks and keeps
//! the free ones on a singly-linked list threaded through the blocks
//! themselves. Partitions are pure software; the HW-RTOS is not involved.

use core::mem::size_of;
use core::ptr::{self, NonNull};

use crate::core::cs_cell::CsCell;
use crate::core::obj::ObjHeader;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};
use crate::hwos::HwosPort;
use crate::kernel::Kernel;
use crate::types::{OsMemQty, OsMemSize, OsObjType};

/// Free list link stored in the first word of every free block
type Link = *mut u8;

const LINK_SIZE: usize = size_of::<Link>();

struct Partition {
    addr: *mut u8,
    free: *mut u8,
    nbr_free: OsMemQty,
    nbr_max: OsMemQty,
    blk_size: OsMemSize,
}

impl Partition {
    const fn empty() -> Self {
        Self {
            addr: ptr::null_mut(),
            free: ptr::null_mut(),
            nbr_free: 0,
            nbr_max: 0,
            blk_size: 0,
        }
    }

    /// `blk` is the start of one of this partition's blocks
    fn owns(&self, blk: *mut u8) -> bool {
        let start = self.addr as usize;
        let end = start + self.nbr_max as usize * self.blk_size;
        let at = blk as usize;
        at >= start && at < end && (at - start) % self.blk_size == 0
    }
}

/// Memory partition control block
pub struct OsMem {
    pub(crate) hdr: ObjHeader,
    part: CsCell<Partition>,
}

impl OsMem {
    pub const fn new() -> Self {
        Self {
            hdr: ObjHeader::new(),
            part: CsCell::new(Partition::empty()),
        }
    }

    #[inline]
    pub fn obj_type(&self) -> OsObjType {
        self.hdr.obj_type()
    }

    /// Blocks currently available
    pub fn nbr_free(&self) -> OsMemQty {
        critical_section(|cs| self.part.get(cs).nbr_free)
    }

    /// Blocks in the partition
    pub fn nbr_max(&self) -> OsMemQty {
        critical_section(|cs| self.part.get(cs).nbr_max)
    }

    pub fn blk_size(&self) -> OsMemSize {
        critical_section(|cs| self.part.get(cs).blk_size)
    }

    #[cfg(feature = "defmt")]
    pub fn name(&self) -> &'static str {
        self.hdr.name()
    }

    fn check(&self) -> OsResult<()> {
        match self.hdr.obj_type() {
            OsObjType::Mem => Ok(()),
            OsObjType::None => Err(OsError::MemInvalidPMem),
            _ => Err(OsError::ObjType),
        }
    }
}

impl Default for OsMem {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HwosPort> Kernel<P> {
    /// Create a fixed-size memory partition
    ///
    /// # Arguments
    /// * `mem` - Partition control block, must not be in use
    /// * `name` - Partition name
    /// * `storage` - Backing storage, pointer aligned
    /// * `n_blks` - Number of blocks, at least 2
    /// * `blk_size` - Block size in bytes, a multiple of the pointer size
    ///
    /// # Returns
    /// * `Ok(())` - Partition created with every block free
    /// * `Err(OsError::MemCreateIsr)` - Called from an ISR
    /// * `Err(OsError::ObjCreated)` - Control block already in use
    /// * `Err(OsError::MemInvalidPAddr)` - Storage not pointer aligned
    /// * `Err(OsError::MemInvalidBlks)` - Fewer than two blocks
    /// * `Err(OsError::MemInvalidSize)` - Bad block size, or storage too small
    pub fn mem_create(
        &self,
        mem: &OsMem,
        name: &'static str,
        storage: &'static mut [u8],
        n_blks: OsMemQty,
        blk_size: OsMemSize,
    ) -> OsResult<()> {
        if self.in_isr() {
            return Err(OsError::MemCreateIsr);
        }

        if mem.hdr.is_created() {
            return Err(OsError::ObjCreated);
        }

        let addr = storage.as_mut_ptr();
        if addr as usize % LINK_SIZE != 0 {
            return Err(OsError::MemInvalidPAddr);
        }

        if n_blks < 2 {
            return Err(OsError::MemInvalidBlks);
        }

        if blk_size < LINK_SIZE || blk_size % LINK_SIZE != 0 {
            return Err(OsError::MemInvalidSize);
        }

        let needed = (n_blks as usize).checked_mul(blk_size).ok_or(OsError::MemInvalidSize)?;
        if storage.len() < needed {
            return Err(OsError::MemInvalidSize);
        }

        // Thread the free list through the blocks, last one ends it
        for i in 0..n_blks as usize {
            let next = if i + 1 < n_blks as usize {
                // SAFETY: in bounds, checked against `storage.len()` above
                unsafe { addr.add((i + 1) * blk_size) }
            } else {
                ptr::null_mut()
            };
            // SAFETY: block `i` is in bounds and pointer aligned
            unsafe { addr.add(i * blk_size).cast::<Link>().write(next) };
        }

        critical_section(|cs| {
            *mem.part.get(cs) = Partition {
                addr,
                free: addr,
                nbr_free: n_blks,
                nbr_max: n_blks,
                blk_size,
            };
            mem.hdr.open(cs, OsObjType::Mem, 0, name);
            let st = self.state.get(cs);
            st.mem_qty = st.mem_qty.wrapping_add(1);
        });

        crate::debug!("mem_create: {} with {} blocks of {} bytes", name, n_blks, blk_size);
        Ok(())
    }

    /// Take a block from the partition
    ///
    /// # Returns
    /// * `Ok(blk)` - Block now owned by the caller
    /// * `Err(OsError::MemInvalidPMem)` - Partition never created
    /// * `Err(OsError::MemNoFreeBlks)` - Partition exhausted
    pub fn mem_get(&self, mem: &OsMem) -> OsResult<NonNull<u8>> {
        mem.check()?;

        critical_section(|cs| {
            let part = mem.part.get(cs);
            let blk = NonNull::new(part.free).ok_or(OsError::MemNoFreeBlks)?;
            if part.nbr_free == 0 {
                return Err(OsError::MemNoFreeBlks);
            }
            // SAFETY: free blocks hold the link written by create or put
            part.free = unsafe { blk.as_ptr().cast::<Link>().read() };
            part.nbr_free -= 1;
            Ok(blk)
        })
    }

    /// Return a block to the partition
    ///
    /// # Returns
    /// * `Ok(())` - Block is free again
    /// * `Err(OsError::MemInvalidPMem)` - Partition never created
    /// * `Err(OsError::MemInvalidPBlk)` - Block does not belong to the partition
    /// * `Err(OsError::MemFull)` - Every block is already free
    pub fn mem_put(&self, mem: &OsMem, blk: NonNull<u8>) -> OsResult<()> {
        mem.check()?;

        critical_section(|cs| {
            let part = mem.part.get(cs);
            if !part.owns(blk.as_ptr()) {
                return Err(OsError::MemInvalidPBlk);
            }
            if part.nbr_free >= part.nbr_max {
                return Err(OsError::MemFull);
            }
            // SAFETY: `blk` is a block of this partition, so aligned and in bounds
            unsafe { blk.as_ptr().cast::<Link>().write(part.free) };
            part.free = blk.as_ptr();
            part.nbr_free += 1;
            Ok(())
        })
    }

    /// Partitions created since [`init`](Kernel::init)
    pub fn mem_qty(&self) -> u16 {
        critical_section(|cs| self.state.get(cs).mem_qty)
    }
}
