//! # host
//! The `HostBackend` relays allocation requests to the platform heap by means
//! of the `kasan_heap_*` functions supplied by the host environment.
use core::ffi::c_void;

use log::trace;
use thiserror::Error;

use crate::{
    GuestAddr, allocator::backend::AllocatorBackend, kasan_heap_allocate, kasan_heap_free,
    kasan_heap_reallocate,
};

#[derive(Debug, Default)]
pub struct HostBackend;

impl AllocatorBackend for HostBackend {
    type Error = HostBackendError;

    fn alloc(&mut self, len: usize) -> Result<GuestAddr, Self::Error> {
        let block = unsafe { kasan_heap_allocate(len) };
        trace!("alloc - len: {len:#x}, block: {block:p}");
        if block.is_null() {
            Err(HostBackendError::OutOfMemory(len))?;
        }
        Ok(block as GuestAddr)
    }

    fn dealloc(&mut self, addr: GuestAddr) -> Result<(), Self::Error> {
        trace!("dealloc - block: {addr:#x}");
        unsafe { kasan_heap_free(addr as *mut c_void) };
        Ok(())
    }

    fn realloc(&mut self, addr: GuestAddr, len: usize) -> Result<GuestAddr, Self::Error> {
        let block = unsafe { kasan_heap_reallocate(addr as *mut c_void, len) };
        trace!("realloc - block: {addr:#x}, len: {len:#x}, new: {block:p}");
        if block.is_null() {
            Err(HostBackendError::OutOfMemory(len))?;
        }
        Ok(block as GuestAddr)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HostBackendError {
    #[error("Out of memory, len: {0:#x}")]
    OutOfMemory(usize),
}
