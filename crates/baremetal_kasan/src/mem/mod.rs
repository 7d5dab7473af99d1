//! # mem
//! Raw, unchecked access to memory. These primitives are used for all shadow
//! writes and for the allocation headers. They must never be routed through
//! the validator, otherwise maintaining the shadow map would recurse into
//! checking it.
//!
//! Two implementations are provided:
//! - `raw` - Direct access through pointers, for use on target.
//! - `arena` - A flat byte buffer standing in for a range of addresses, for
//!   use on a host.
use core::fmt::Debug;

use crate::GuestAddr;

#[cfg(feature = "arena")]
pub mod arena;

pub mod raw;

pub trait Memory: Debug {
    fn read(&self, addr: GuestAddr, buf: &mut [u8]);

    fn write(&mut self, addr: GuestAddr, buf: &[u8]);

    fn load(&self, addr: GuestAddr) -> u8 {
        let mut buf = [0u8; 1];
        self.read(addr, &mut buf);
        buf[0]
    }

    fn fill(&mut self, addr: GuestAddr, value: u8, len: usize) {
        for i in 0..len {
            self.write(addr + i, &[value]);
        }
    }

    /// Copies `len` bytes from `src` to `dst`, the ranges may overlap.
    fn copy(&mut self, dst: GuestAddr, src: GuestAddr, len: usize) {
        let mut buf = [0u8; 1];
        if src < dst {
            for i in (0..len).rev() {
                self.read(src + i, &mut buf);
                self.write(dst + i, &buf);
            }
        } else {
            for i in 0..len {
                self.read(src + i, &mut buf);
                self.write(dst + i, &buf);
            }
        }
    }
}
