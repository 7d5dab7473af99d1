//! # shadow
//! The shadow map records, for every eight byte granule of real memory,
//! whether that granule may be accessed. A shadow byte of zero marks the
//! whole granule as accessible, a value `n` in `1..=7` marks only the first
//! `n` bytes as accessible and the remaining values tag the granule as part
//! of a red-zone of a particular kind.
//!
//! Real and shadow addresses live in two separate address spaces. The only
//! way to move between them is `Shadow::to_shadow` and `Shadow::to_real`.
use core::fmt::Debug;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::GuestAddr;

pub mod guest;

pub const SHADOW_SHIFT: usize = 3;
pub const SHADOW_GRANULE_SIZE: usize = 1 << SHADOW_SHIFT;
pub const SHADOW_MASK: usize = SHADOW_GRANULE_SIZE - 1;

pub const SHADOW_UNPOISONED: u8 = 0x00;

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PoisonType {
    AsanStackLeftRz = 0xf1,
    AsanStackMidRz = 0xf2,
    AsanStackRightRz = 0xf3,
    AsanStackAfterReturn = 0xf5,
    AsanStackUseAfterScope = 0xf8,
    AsanGlobalRz = 0xf9,
    AsanHeapLeftRz = 0xfa,
    AsanHeapRightRz = 0xfb,
    AsanHeapFreed = 0xfd,
    AsanReserved = 0xff,
}

impl PoisonType {
    pub const fn description(self) -> &'static str {
        match self {
            PoisonType::AsanStackLeftRz => "stack left redzone",
            PoisonType::AsanStackMidRz => "stack mid redzone",
            PoisonType::AsanStackRightRz => "stack right redzone",
            PoisonType::AsanStackAfterReturn => "stack after return",
            PoisonType::AsanStackUseAfterScope => "stack use after scope",
            PoisonType::AsanGlobalRz => "global redzone",
            PoisonType::AsanHeapLeftRz => "heap left redzone",
            PoisonType::AsanHeapRightRz => "heap right redzone",
            PoisonType::AsanHeapFreed => "freed heap region",
            PoisonType::AsanReserved => "reserved",
        }
    }
}

/// Describes the meaning of a raw shadow byte.
pub fn describe_shadow_byte(value: u8) -> &'static str {
    match value {
        SHADOW_UNPOISONED => "addressable",
        1..=7 => "partially addressable",
        _ => PoisonType::try_from(value)
            .map(PoisonType::description)
            .unwrap_or("unknown"),
    }
}

/// The fixed placement of the shadow map and the high memory region.
pub trait ShadowLayout: Debug {
    /// Base address of the shadow region, `to_shadow(0)`.
    const SHADOW_OFFSET: GuestAddr;
    /// First address of high memory. Memory between the end of low memory and
    /// this address is the I/O window, which is never checked.
    const HIGH_MEM_OFFSET: GuestAddr;
    /// The alignment guaranteed by the platform heap for every block.
    const HEAP_BLOCK_ALIGN: usize;
}

pub trait Shadow: Debug {
    fn to_shadow(addr: GuestAddr) -> GuestAddr;
    fn to_real(shadow_addr: GuestAddr) -> GuestAddr;

    /// Writes `val` to every shadow byte covering `[start, start + len)`.
    /// Both `start` and `len` must be granule aligned.
    fn poison(&mut self, start: GuestAddr, len: usize, val: PoisonType);

    /// Marks `[start, start + len)` as accessible. `start` must be granule
    /// aligned, a trailing partial granule is encoded by its length.
    fn unpoison(&mut self, start: GuestAddr, len: usize);

    /// Writes `tag` to `len` bytes of shadow memory starting at the shadow
    /// address `shadow_addr`.
    fn set_shadow(&mut self, shadow_addr: GuestAddr, len: usize, tag: u8);

    /// Reads the shadow byte at the shadow address `shadow_addr`.
    fn load(&self, shadow_addr: GuestAddr) -> u8;

    fn is_poison(&self, start: GuestAddr, len: usize) -> bool;
}
