//! # access
//! The hooks inserted by `-fsanitize=kernel-address` around loads and stores,
//! the shadow setters used for stack red-zones and the global registration
//! hooks. Checks never abort: a violation is reported and execution resumes.
use core::ffi::{c_char, c_void};

use log::trace;
use paste::paste;

use crate::{
    GuestAddr,
    arch::return_address,
    globals::GlobalDescriptor,
    hooks::{KASAN, check},
    mem::{Memory, raw::RawMemory},
};

macro_rules! define_access_hooks {
    ($($size:literal),*) => {
        paste! {
            $(
                #[unsafe(no_mangle)]
                pub extern "C" fn [<__asan_load $size _noabort>](addr: GuestAddr) {
                    let ip = return_address();
                    check(addr, $size, false, ip);
                }

                #[unsafe(no_mangle)]
                pub extern "C" fn [<__asan_store $size _noabort>](addr: GuestAddr) {
                    let ip = return_address();
                    check(addr, $size, true, ip);
                }
            )*
        }
    };
}

define_access_hooks!(1, 2, 4, 8, 16);

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn __asan_loadN_noabort(addr: GuestAddr, size: usize) {
    let ip = return_address();
    check(addr, size, false, ip);
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn __asan_storeN_noabort(addr: GuestAddr, size: usize) {
    let ip = return_address();
    check(addr, size, true, ip);
}

macro_rules! define_set_shadow_hooks {
    ($($tag:tt => $val:literal),*) => {
        paste! {
            $(
                /// Writes the tag to `size` shadow bytes. `addr` is a shadow
                /// address computed by the instrumentation. The runtime is not
                /// involved, these are also called before initialization.
                #[unsafe(no_mangle)]
                pub extern "C" fn [<__asan_set_shadow_ $tag>](addr: *mut c_void, size: usize) {
                    let mut memory = unsafe { RawMemory::new() };
                    memory.fill(addr as GuestAddr, $val, size);
                }
            )*
        }
    };
}

define_set_shadow_hooks!(
    00 => 0x00,
    f1 => 0xf1,
    f2 => 0xf2,
    f3 => 0xf3,
    f5 => 0xf5,
    f8 => 0xf8
);

/// # Safety
/// `globals` must point to `n` valid descriptors.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_register_globals(globals: *const GlobalDescriptor, n: usize) {
    trace!("register_globals - globals: {globals:p}, n: {n:#x}");
    if globals.is_null() || n == 0 {
        return;
    }
    let globals = unsafe { core::slice::from_raw_parts(globals, n) };
    KASAN.lock().register_globals(globals);
}

/// # Safety
/// `globals` must point to `n` valid descriptors.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_unregister_globals(globals: *const GlobalDescriptor, n: usize) {
    trace!("unregister_globals - globals: {globals:p}, n: {n:#x}");
    if globals.is_null() || n == 0 {
        return;
    }
    let globals = unsafe { core::slice::from_raw_parts(globals, n) };
    KASAN.lock().unregister_globals(globals);
}

#[unsafe(no_mangle)]
pub extern "C" fn __asan_handle_no_return() {}

#[unsafe(no_mangle)]
pub extern "C" fn __asan_before_dynamic_init(_module_name: *const c_char) {}

#[unsafe(no_mangle)]
pub extern "C" fn __asan_after_dynamic_init() {}
