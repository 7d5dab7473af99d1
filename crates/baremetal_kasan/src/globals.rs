//! # globals
//! The compiler emits one `GlobalDescriptor` for every sanitized global
//! variable and passes the table to `__asan_register_globals` at startup. Each
//! global is laid out with a trailing red-zone, `size_with_redzone` covers
//! both the variable and its red-zone.
//!
//! There is no leading red-zone, so accesses immediately before the start of
//! a global are not detected.
use core::ffi::{CStr, c_char, c_void};

use log::trace;

use crate::{
    GuestAddr,
    shadow::{PoisonType, SHADOW_MASK, Shadow},
};

/// Mirrors the layout of `struct __asan_global`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlobalDescriptor {
    pub start: *const c_void,
    pub size: usize,
    pub size_with_redzone: usize,
    pub name: *const c_char,
    pub module_name: *const c_char,
    pub has_dynamic_init: usize,
    pub location: *mut c_void,
    pub odr_indicator: u32,
}

impl GlobalDescriptor {
    pub fn start(&self) -> GuestAddr {
        self.start as GuestAddr
    }

    /// # Safety
    /// `name` must be null or point to a zero-terminated string.
    pub unsafe fn name(&self) -> Option<&CStr> {
        if self.name.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(self.name) })
        }
    }
}

pub fn register_global<S: Shadow>(shadow: &mut S, global: &GlobalDescriptor) {
    let start = global.start();
    trace!(
        "register_global - start: {start:#x}, size: {:#x}, size_with_redzone: {:#x}",
        global.size, global.size_with_redzone
    );
    shadow.unpoison(start, global.size);

    let aligned_size = (global.size + SHADOW_MASK) & !SHADOW_MASK;
    shadow.poison(
        start + aligned_size,
        global.size_with_redzone.saturating_sub(aligned_size),
        PoisonType::AsanGlobalRz,
    );
}

pub fn register_globals<S: Shadow>(shadow: &mut S, globals: &[GlobalDescriptor]) {
    for global in globals {
        register_global(shadow, global);
    }
}

/// Globals live for the whole program, so there is nothing to undo.
pub fn unregister_globals(_globals: &[GlobalDescriptor]) {}
