//! # heap
//! The allocation hooks called by the platform heap allocator in place of its
//! own entry points. Failures are reported to the caller as null. Running out
//! of memory is left to the caller to diagnose, any other failure is logged
//! once the runtime has been released.
use core::ffi::c_void;

use log::{error, trace};

use crate::{
    GuestAddr,
    allocator::{backend::host::HostBackend, frontend::redzone::RedzoneFrontendError},
    hooks::KASAN,
};

fn log_failure(op: &str, ptr: *mut c_void, size: usize, e: &RedzoneFrontendError<HostBackend>) {
    match e {
        RedzoneFrontendError::AllocatorError(_) => {}
        _ => error!("{op} - ptr: {ptr:p}, size: {size:#x}, error: {e}"),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn kasan_allocate_hook(size: usize) -> *mut c_void {
    trace!("allocate - size: {size:#x}");
    let result = KASAN.lock().alloc(size);
    match result {
        Ok(addr) => addr as *mut c_void,
        Err(e) => {
            log_failure("allocate", core::ptr::null_mut(), size, &e);
            core::ptr::null_mut()
        }
    }
}

/// # Safety
/// `ptr` must be null or have been returned by `kasan_allocate_hook` or
/// `kasan_reallocate_hook` and not yet been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kasan_free_hook(ptr: *mut c_void) {
    trace!("free - ptr: {ptr:p}");
    let result = KASAN.lock().dealloc(ptr as GuestAddr);
    if let Err(e) = result {
        log_failure("free", ptr, 0, &e);
    }
}

/// # Safety
/// See `kasan_free_hook`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kasan_reallocate_hook(ptr: *mut c_void, size: usize) -> *mut c_void {
    trace!("reallocate - ptr: {ptr:p}, size: {size:#x}");
    let result = KASAN.lock().realloc(ptr as GuestAddr, size);
    match result {
        Ok(addr) => addr as *mut c_void,
        Err(e) => {
            log_failure("reallocate", ptr, size, &e);
            core::ptr::null_mut()
        }
    }
}
