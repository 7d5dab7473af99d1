//! # redzone
//! The redzone frontend surrounds every allocation with a head red-zone and a
//! tail red-zone, both taken from the same backend block:
//!
//! ```text
//! block            block + head     + aligned        + tail
//! | header | ..... | payload ... pad | tail red-zone |
//! ```
//!
//! The head red-zone is as large as the backend's block alignment, so that
//! the payload keeps the alignment guarantee of the platform heap. Its first
//! bytes hold the header, which records the aligned payload size so that the
//! block can be poisoned again when it is freed. All metadata is therefore
//! stored in-band and no bookkeeping is required in the frontend itself.
use core::mem::size_of;

use log::debug;
use thiserror::Error;

use crate::{
    GuestAddr,
    allocator::backend::AllocatorBackend,
    mem::Memory,
    shadow::{PoisonType, SHADOW_GRANULE_SIZE, SHADOW_MASK, Shadow},
};

/// The aligned payload size, stored at the start of each block.
pub type AllocationHeader = u32;

pub const HEADER_SIZE: usize = size_of::<AllocationHeader>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AllocateParams {
    aligned_size: usize,
    total_size: usize,
}

#[derive(Debug)]
pub struct RedzoneFrontend<B: AllocatorBackend, H: Memory> {
    backend: B,
    memory: H,
    head_redzone_size: usize,
    tail_redzone_size: usize,
}

/// The sizes of the red-zones placed before and after each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedzoneSizes {
    head: usize,
    tail: usize,
}

impl RedzoneSizes {
    pub const DEFAULT_HEAD_REDZONE_SIZE: usize = 64;
    pub const DEFAULT_TAIL_REDZONE_SIZE: usize = 0x20;

    /// The head red-zone must hold the header and both must be granule
    /// aligned.
    pub const fn new(head: usize, tail: usize) -> Result<RedzoneSizes, RedzoneSizeError> {
        if head < HEADER_SIZE || head < SHADOW_GRANULE_SIZE || head % SHADOW_GRANULE_SIZE != 0 {
            return Err(RedzoneSizeError::InvalidHeadRedZoneSize(head));
        }
        if tail % SHADOW_GRANULE_SIZE != 0 {
            return Err(RedzoneSizeError::InvalidTailRedZoneSize(tail));
        }
        Ok(RedzoneSizes { head, tail })
    }

    pub const fn head(&self) -> usize {
        self.head
    }

    pub const fn tail(&self) -> usize {
        self.tail
    }
}

impl Default for RedzoneSizes {
    fn default() -> Self {
        RedzoneSizes {
            head: Self::DEFAULT_HEAD_REDZONE_SIZE,
            tail: Self::DEFAULT_TAIL_REDZONE_SIZE,
        }
    }
}

impl<B: AllocatorBackend, H: Memory> RedzoneFrontend<B, H> {
    /// `memory` provides raw access to the blocks returned by `backend`, it is
    /// used to read and write the allocation headers.
    pub const fn new(backend: B, memory: H, redzones: RedzoneSizes) -> RedzoneFrontend<B, H> {
        RedzoneFrontend {
            backend,
            memory,
            head_redzone_size: redzones.head,
            tail_redzone_size: redzones.tail,
        }
    }

    pub fn alloc<S: Shadow>(
        &mut self,
        shadow: &mut S,
        len: usize,
    ) -> Result<GuestAddr, RedzoneFrontendError<B>> {
        debug!("alloc - len: {len:#x}");
        let params = self.allocate_params(len)?;
        let block = self
            .backend
            .alloc(params.total_size)
            .map_err(RedzoneFrontendError::AllocatorError)?;
        Ok(self.shadow_allocated(shadow, block, len, params.aligned_size))
    }

    pub fn dealloc<S: Shadow>(
        &mut self,
        shadow: &mut S,
        addr: GuestAddr,
    ) -> Result<(), RedzoneFrontendError<B>> {
        debug!("dealloc - addr: {addr:#x}");
        if addr == 0 {
            return Ok(());
        }

        let block = self.block_of(addr)?;
        let aligned_size = self.read_header(block);
        self.backend
            .dealloc(block)
            .map_err(RedzoneFrontendError::AllocatorError)?;
        shadow.poison(addr, aligned_size, PoisonType::AsanHeapFreed);
        Ok(())
    }

    /// Resizes the allocation at `addr`. The old payload is poisoned as freed
    /// before the backend is asked to resize it, and stays poisoned should the
    /// backend fail.
    pub fn realloc<S: Shadow>(
        &mut self,
        shadow: &mut S,
        addr: GuestAddr,
        len: usize,
    ) -> Result<GuestAddr, RedzoneFrontendError<B>> {
        debug!("realloc - addr: {addr:#x}, len: {len:#x}");
        if addr == 0 {
            return self.alloc(shadow, len);
        }

        let params = self.allocate_params(len)?;
        let block = self.block_of(addr)?;
        let old_aligned_size = self.read_header(block);
        shadow.poison(addr, old_aligned_size, PoisonType::AsanHeapFreed);

        let new_block = self
            .backend
            .realloc(block, params.total_size)
            .map_err(RedzoneFrontendError::AllocatorError)?;
        Ok(self.shadow_allocated(shadow, new_block, len, params.aligned_size))
    }

    /// Returns the aligned payload size recorded for the allocation at `addr`.
    pub fn get_size(&self, addr: GuestAddr) -> Result<usize, RedzoneFrontendError<B>> {
        let block = self.block_of(addr)?;
        Ok(self.read_header(block))
    }

    fn allocate_params(&self, len: usize) -> Result<AllocateParams, RedzoneFrontendError<B>> {
        let aligned_size = len
            .checked_add(SHADOW_MASK)
            .map(|size| size & !SHADOW_MASK)
            .filter(|size| AllocationHeader::try_from(*size).is_ok())
            .ok_or(RedzoneFrontendError::SizeOverflow(len))?;
        let total_size = aligned_size
            .checked_add(self.head_redzone_size + self.tail_redzone_size)
            .ok_or(RedzoneFrontendError::SizeOverflow(len))?;
        Ok(AllocateParams {
            aligned_size,
            total_size,
        })
    }

    fn shadow_allocated<S: Shadow>(
        &mut self,
        shadow: &mut S,
        block: GuestAddr,
        len: usize,
        aligned_size: usize,
    ) -> GuestAddr {
        let data = block + self.head_redzone_size;
        debug!("alloc - block: {block:#x}, data: {data:#x}, aligned: {aligned_size:#x}");

        self.write_header(block, aligned_size);
        shadow.unpoison(data, len);
        shadow.poison(block, self.head_redzone_size, PoisonType::AsanHeapLeftRz);
        shadow.poison(
            data + aligned_size,
            self.tail_redzone_size,
            PoisonType::AsanHeapRightRz,
        );
        data
    }

    fn block_of(&self, addr: GuestAddr) -> Result<GuestAddr, RedzoneFrontendError<B>> {
        addr.checked_sub(self.head_redzone_size)
            .ok_or(RedzoneFrontendError::InvalidAddress(addr))
    }

    // `aligned_size` has been checked to fit by `allocate_params`.
    fn write_header(&mut self, block: GuestAddr, aligned_size: usize) {
        let header = aligned_size as AllocationHeader;
        self.memory.write(block, &header.to_ne_bytes());
    }

    fn read_header(&self, block: GuestAddr) -> usize {
        let mut buf = [0u8; HEADER_SIZE];
        self.memory.read(block, &mut buf);
        AllocationHeader::from_ne_bytes(buf) as usize
    }

    pub fn head_redzone_size(&self) -> usize {
        self.head_redzone_size
    }

    pub fn tail_redzone_size(&self) -> usize {
        self.tail_redzone_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn memory(&self) -> &H {
        &self.memory
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedzoneSizeError {
    #[error("Invalid head red_zone_size: {0}")]
    InvalidHeadRedZoneSize(usize),
    #[error("Invalid tail red_zone_size: {0}")]
    InvalidTailRedZoneSize(usize),
}

#[derive(Error, Debug)]
pub enum RedzoneFrontendError<B: AllocatorBackend> {
    #[error("Allocator error: {0:?}")]
    AllocatorError(B::Error),
    #[error("Allocation size overflow: {0:#x}")]
    SizeOverflow(usize),
    #[error("Invalid address: {0:#x}")]
    InvalidAddress(GuestAddr),
}
