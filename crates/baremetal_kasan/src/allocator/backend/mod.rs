//! # backend
//! The backend is the platform heap allocator. Only its request/response
//! contract is relied upon:
//!
//! - Every block returned is aligned to at least the head red-zone size of
//!   the frontend.
//! - A failed request is reported as an error (a null pointer on the C side)
//!   and leaves any existing block untouched.
//! - `realloc` preserves the contents of the block up to the smaller of the
//!   old and new sizes.
use core::fmt::Debug;

use crate::GuestAddr;

#[cfg(feature = "hooks")]
pub mod host;

pub trait AllocatorBackend: Sized + Debug + Send {
    type Error: Debug;
    fn alloc(&mut self, len: usize) -> Result<GuestAddr, Self::Error>;
    fn dealloc(&mut self, addr: GuestAddr) -> Result<(), Self::Error>;
    fn realloc(&mut self, addr: GuestAddr, len: usize) -> Result<GuestAddr, Self::Error>;
}
