//! # lifecycle
//! The runtime is inert until it has been initialized with the sizes of the
//! memory regions of the target. These sizes are only known at run time (they
//! depend on the amount of memory fitted), whereas the placement of the
//! shadow region and the high memory region is fixed by the `ShadowLayout`.
use crate::{GuestAddr, shadow::ShadowLayout};

/// Supplies the sizes of the memory regions, queried once on initialization.
pub trait MemorySystem {
    fn shadow_mem_size(&self) -> usize;
    fn low_mem_size(&self) -> usize;
    fn high_mem_size(&self) -> usize;
}

/// The region boundaries established on initialization. All ranges are half
/// open.
///
/// || `[high_mem_end, ..)`               || Unchecked ||
/// || `[high_mem_start, high_mem_end)`   || HighMem   ||
/// || `[low_mem_end, high_mem_start)`    || I/O       ||
/// || `[0, low_mem_end)`                 || LowMem    ||
///
/// The shadow region `[shadow_start, shadow_end)` is part of low memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowBounds {
    pub shadow_start: GuestAddr,
    pub shadow_end: GuestAddr,
    pub low_mem_end: GuestAddr,
    pub high_mem_start: GuestAddr,
    pub high_mem_end: GuestAddr,
}

impl ShadowBounds {
    pub fn new<L: ShadowLayout, M: MemorySystem>(memory_system: &M) -> ShadowBounds {
        let shadow_size = memory_system.shadow_mem_size();
        ShadowBounds {
            shadow_start: L::SHADOW_OFFSET,
            shadow_end: L::SHADOW_OFFSET + shadow_size,
            low_mem_end: memory_system.low_mem_size(),
            high_mem_start: L::HIGH_MEM_OFFSET,
            high_mem_end: L::HIGH_MEM_OFFSET + memory_system.high_mem_size(),
        }
    }

    pub fn shadow_size(&self) -> usize {
        self.shadow_end - self.shadow_start
    }

    /// `last` is the address of the final byte of the range.
    pub fn is_shadow(&self, start: GuestAddr, last: GuestAddr) -> bool {
        self.shadow_start <= start && last < self.shadow_end
    }

    pub fn is_io(&self, start: GuestAddr, last: GuestAddr) -> bool {
        self.low_mem_end <= start && last < self.high_mem_start
    }

    pub fn is_beyond_high_mem(&self, last: GuestAddr) -> bool {
        self.high_mem_end <= last
    }
}

/// Fixed region sizes, for hosts which know them up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMemorySystem {
    pub shadow_mem_size: usize,
    pub low_mem_size: usize,
    pub high_mem_size: usize,
}

impl MemorySystem for StaticMemorySystem {
    fn shadow_mem_size(&self) -> usize {
        self.shadow_mem_size
    }

    fn low_mem_size(&self) -> usize {
        self.low_mem_size
    }

    fn high_mem_size(&self) -> usize {
        self.high_mem_size
    }
}
