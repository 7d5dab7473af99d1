//! # guest
//! This implementation of the shadow map keeps the shadow bytes in a linear
//! region of the target's own memory, located at `ShadowLayout::SHADOW_OFFSET`.
//! All reads and writes of shadow bytes go through the raw `Memory`
//! primitives and are therefore never themselves subject to validation.
use core::marker::PhantomData;

use log::{debug, trace};

use crate::{
    GuestAddr,
    mem::Memory,
    shadow::{PoisonType, SHADOW_MASK, SHADOW_SHIFT, SHADOW_UNPOISONED, Shadow, ShadowLayout},
    validator::first_poisoned,
};

mod layout {
    include!(concat!(env!("OUT_DIR"), "/gen_layout.rs"));
}

pub use layout::DefaultShadowLayout;

#[derive(Debug)]
pub struct GuestShadow<M: Memory, L: ShadowLayout> {
    memory: M,
    _phantom: PhantomData<L>,
}

impl<M: Memory, L: ShadowLayout> Shadow for GuestShadow<M, L> {
    fn to_shadow(addr: GuestAddr) -> GuestAddr {
        (addr >> SHADOW_SHIFT) + L::SHADOW_OFFSET
    }

    fn to_real(shadow_addr: GuestAddr) -> GuestAddr {
        (shadow_addr - L::SHADOW_OFFSET) << SHADOW_SHIFT
    }

    fn poison(&mut self, start: GuestAddr, len: usize, val: PoisonType) {
        debug!("poison - start: {start:#x}, len: {len:#x}, poison: {val:?}");
        debug_assert!(Self::is_aligned(start), "unaligned poison start {start:#x}");
        debug_assert!(Self::is_aligned(len), "unaligned poison length {len:#x}");
        self.fill(start, len, val.into());
    }

    fn unpoison(&mut self, start: GuestAddr, len: usize) {
        debug!("unpoison - start: {start:#x}, len: {len:#x}");
        debug_assert!(Self::is_aligned(start), "unaligned unpoison start {start:#x}");
        self.fill(start, Self::align_down(len), SHADOW_UNPOISONED);

        let partial = len & SHADOW_MASK;
        if partial != 0 {
            let shadow_addr = Self::to_shadow(start + len);
            self.memory.fill(shadow_addr, partial as u8, 1);
        }
    }

    fn set_shadow(&mut self, shadow_addr: GuestAddr, len: usize, tag: u8) {
        trace!("set_shadow - shadow: {shadow_addr:#x}, len: {len:#x}, tag: {tag:#x}");
        self.memory.fill(shadow_addr, tag, len);
    }

    fn load(&self, shadow_addr: GuestAddr) -> u8 {
        self.memory.load(shadow_addr)
    }

    fn is_poison(&self, start: GuestAddr, len: usize) -> bool {
        first_poisoned(self, start, len).is_some()
    }
}

impl<M: Memory, L: ShadowLayout> GuestShadow<M, L> {
    pub const SHADOW_OFFSET: GuestAddr = L::SHADOW_OFFSET;
    pub const HIGH_MEM_OFFSET: GuestAddr = L::HIGH_MEM_OFFSET;

    pub const fn new(memory: M) -> GuestShadow<M, L> {
        GuestShadow {
            memory,
            _phantom: PhantomData,
        }
    }

    // `start` and `len` are granule aligned, so the shadow range has exactly
    // `len >> SHADOW_SHIFT` bytes.
    fn fill(&mut self, start: GuestAddr, len: usize, val: u8) {
        if len == 0 {
            return;
        }
        let shadow_start = Self::to_shadow(start);
        let shadow_end = Self::to_shadow(start + len - 1) + 1;
        self.memory.fill(shadow_start, val, shadow_end - shadow_start);
    }

    pub fn align_up(size: usize) -> usize {
        assert!(size <= GuestAddr::MAX - SHADOW_MASK);
        (size + SHADOW_MASK) & !SHADOW_MASK
    }

    pub fn align_down(size: usize) -> usize {
        size & !SHADOW_MASK
    }

    pub fn is_aligned(addr: GuestAddr) -> bool {
        addr & SHADOW_MASK == 0
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }
}
