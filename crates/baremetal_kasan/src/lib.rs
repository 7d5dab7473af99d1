//! # baremetal_kasan
//!
//! `baremetal_kasan` is an address sanitizer runtime intended for bare-metal
//! targets which have no virtual memory to back a conventional ASan shadow
//! map. Out-of-bounds and use-after-free accesses to heap, stack and global
//! memory are detected by keeping a shadow copy of main memory at a reduced
//! granularity (one shadow byte per eight bytes) and by servicing the calls
//! which the compiler's `-fsanitize=kernel-address` instrumentation inserts.
//!
//! The runtime is split into the following components:
//!
//! - `shadow` - The mapping between real and shadow memory together with the
//!   raw poison and unpoison primitives.
//! - `validator` - Decides whether a given access is legal.
//! - `allocator` - Wraps the platform heap allocator, adding red-zones around
//!   each allocation and poisoning blocks on free.
//! - `globals` - Applies red-zones to global variables described by the
//!   compiler generated descriptor table.
//! - `report` - Formats diagnostics for detected violations.
//! - `runtime` - The context object tying the above together, including the
//!   one-shot initialization.
//! - `hooks` - The fixed `extern "C"` entry points used by compiler generated
//!   code. These are only built with the `hooks` feature since they depend on
//!   symbols supplied by the host environment.
//!
//! Real and shadow memory are accessed through the `mem::Memory` trait. On
//! target this is `mem::raw::RawMemory`, on a host (for testing) memory is
//! modelled by `mem::arena::ArenaMemory`.
#![no_std]

#[cfg(feature = "arena")]
extern crate alloc;

pub mod allocator;

#[cfg(feature = "hooks")]
pub mod arch;

pub mod globals;

#[cfg(feature = "hooks")]
pub mod hooks;

pub mod lifecycle;

pub mod logger;

pub mod mem;

pub mod report;

pub mod runtime;

pub mod shadow;


pub mod validator;

pub type GuestAddr = usize;

#[cfg(feature = "hooks")]
use ::core::ffi::{c_uint, c_void};

// Collaborators provided by the host environment.
#[cfg(feature = "hooks")]
unsafe extern "C" {
    pub fn kasan_shadow_mem_size() -> usize;
    pub fn kasan_low_mem_size() -> usize;
    pub fn kasan_high_mem_size() -> usize;
    pub fn kasan_heap_allocate(size: usize) -> *mut c_void;
    pub fn kasan_heap_free(block: *mut c_void);
    pub fn kasan_heap_reallocate(block: *mut c_void, size: usize) -> *mut c_void;
    pub fn kasan_log_write(
        category: *const u8,
        category_len: usize,
        severity: c_uint,
        msg: *const u8,
        msg_len: usize,
    );
}
