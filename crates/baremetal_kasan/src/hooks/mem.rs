//! # mem
//! Checked replacements for `memcpy` and `memset`, for targets where these are
//! not instrumented at their call sites. The copy itself uses the raw memory
//! primitives so it is never lowered into a call back into these functions.
use core::ffi::{c_int, c_void};

use crate::{
    GuestAddr,
    arch::return_address,
    hooks::check,
    mem::{Memory, raw::RawMemory},
};

/// # Safety
/// See man pages
#[unsafe(no_mangle)]
pub unsafe extern "C" fn memcpy(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    let ip = return_address();
    if n == 0 {
        return dest;
    }
    check(dest as GuestAddr, n, true, ip);
    check(src as GuestAddr, n, false, ip);
    let mut memory = unsafe { RawMemory::new() };
    memory.copy(dest as GuestAddr, src as GuestAddr, n);
    dest
}

/// # Safety
/// See man pages
#[unsafe(no_mangle)]
pub unsafe extern "C" fn memset(dest: *mut c_void, c: c_int, n: usize) -> *mut c_void {
    let ip = return_address();
    if n == 0 {
        return dest;
    }
    check(dest as GuestAddr, n, true, ip);
    let mut memory = unsafe { RawMemory::new() };
    memory.fill(dest as GuestAddr, c as u8, n);
    dest
}
