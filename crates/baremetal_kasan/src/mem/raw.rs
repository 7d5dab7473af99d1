//! # raw
//! Direct, unchecked access to physical memory. Each byte is moved with a
//! volatile access so that the compiler cannot lower these loops into calls
//! to `memset` or `memcpy`, which may themselves be instrumented.
use core::ptr::{read_volatile, write_volatile};

use crate::{GuestAddr, mem::Memory};

#[derive(Debug, Clone, Copy)]
pub struct RawMemory {
    _private: (),
}

impl RawMemory {
    /// # Safety
    /// Every address later passed to this `RawMemory` must be valid for reads
    /// and writes for the length of the operation.
    pub const unsafe fn new() -> RawMemory {
        RawMemory { _private: () }
    }
}

impl Memory for RawMemory {
    fn read(&self, addr: GuestAddr, buf: &mut [u8]) {
        let src = addr as *const u8;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = unsafe { read_volatile(src.add(i)) };
        }
    }

    fn write(&mut self, addr: GuestAddr, buf: &[u8]) {
        let dst = addr as *mut u8;
        for (i, b) in buf.iter().enumerate() {
            unsafe { write_volatile(dst.add(i), *b) };
        }
    }

    fn load(&self, addr: GuestAddr) -> u8 {
        unsafe { read_volatile(addr as *const u8) }
    }

    fn fill(&mut self, addr: GuestAddr, value: u8, len: usize) {
        let dst = addr as *mut u8;
        for i in 0..len {
            unsafe { write_volatile(dst.add(i), value) };
        }
    }

    fn copy(&mut self, dst: GuestAddr, src: GuestAddr, len: usize) {
        let dst = dst as *mut u8;
        let src = src as *const u8;
        if (src as GuestAddr) < (dst as GuestAddr) {
            for i in (0..len).rev() {
                unsafe { write_volatile(dst.add(i), read_volatile(src.add(i))) };
            }
        } else {
            for i in 0..len {
                unsafe { write_volatile(dst.add(i), read_volatile(src.add(i))) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_copy_real_buffer() {
        let mut buf = [0u8; 32];
        let base = buf.as_mut_ptr() as GuestAddr;
        let mut mem = unsafe { RawMemory::new() };

        mem.fill(base, 0xab, 8);
        mem.copy(base + 4, base, 8);
        mem.write(base + 20, &[1, 2, 3]);

        assert_eq!(mem.load(base + 21), 2);
        let mut out = [0u8; 12];
        mem.read(base, &mut out);
        assert_eq!(out, [0xab; 12]);
        assert_eq!(buf[12], 0);
    }
}
