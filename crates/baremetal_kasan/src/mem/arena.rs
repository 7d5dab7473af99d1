//! # arena
//! Models a contiguous range of the target address space as a heap allocated
//! byte buffer. This permits the runtime to be exercised on a host, where the
//! addresses used by the target (including the shadow region) are not mapped.
use alloc::{vec, vec::Vec};
use core::ops::Range;

use crate::{GuestAddr, mem::Memory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaMemory {
    base: GuestAddr,
    bytes: Vec<u8>,
}

impl ArenaMemory {
    pub fn new(base: GuestAddr, len: usize) -> ArenaMemory {
        ArenaMemory {
            base,
            bytes: vec![0; len],
        }
    }

    pub fn range(&self) -> Range<GuestAddr> {
        self.base..self.base + self.bytes.len()
    }

    pub fn contains(&self, addr: GuestAddr, len: usize) -> bool {
        addr >= self.base
            && addr
                .checked_add(len)
                .is_some_and(|end| end <= self.base + self.bytes.len())
    }

    /// # Panics
    /// Panics if `[addr, addr + len)` is not covered by the arena.
    fn offset(&self, addr: GuestAddr, len: usize) -> usize {
        assert!(
            self.contains(addr, len),
            "arena access out of range - addr: {addr:#x}, len: {len:#x}, arena: {:#x?}",
            self.range()
        );
        addr - self.base
    }
}

impl Memory for ArenaMemory {
    fn read(&self, addr: GuestAddr, buf: &mut [u8]) {
        let offset = self.offset(addr, buf.len());
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
    }

    fn write(&mut self, addr: GuestAddr, buf: &[u8]) {
        let offset = self.offset(addr, buf.len());
        self.bytes[offset..offset + buf.len()].copy_from_slice(buf);
    }

    fn fill(&mut self, addr: GuestAddr, value: u8, len: usize) {
        let offset = self.offset(addr, len);
        self.bytes[offset..offset + len].fill(value);
    }

    fn copy(&mut self, dst: GuestAddr, src: GuestAddr, len: usize) {
        let src = self.offset(src, len);
        let dst = self.offset(dst, len);
        self.bytes.copy_within(src..src + len, dst);
    }
}
