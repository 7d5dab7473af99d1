//! # runtime
//! `KasanRuntime` is the single owner of all sanitizer state: the shadow map,
//! the region bounds established on initialization, the reporter and the
//! heap frontend. Until `initialize` has been called every check is accepted
//! without consulting the shadow map, so memory activity during boot is not
//! checked.
//!
//! `initialize` and `check` emit no log records of their own. Reporting is
//! left to the `Report` implementation and the outcome of `initialize` to the
//! caller.
use thiserror::Error;

use crate::{
    GuestAddr,
    allocator::{
        backend::AllocatorBackend,
        frontend::redzone::{RedzoneFrontend, RedzoneFrontendError},
    },
    globals::{self, GlobalDescriptor},
    lifecycle::{MemorySystem, ShadowBounds},
    mem::Memory,
    report::{Report, Violation},
    shadow::{PoisonType, Shadow, ShadowLayout},
    validator::AccessValidator,
};

#[derive(Debug)]
pub struct KasanRuntime<S: Shadow, B: AllocatorBackend, H: Memory, R: Report> {
    shadow: S,
    bounds: Option<ShadowBounds>,
    reporter: R,
    heap: RedzoneFrontend<B, H>,
}

impl<S: Shadow, B: AllocatorBackend, H: Memory, R: Report> KasanRuntime<S, B, H, R> {
    pub const fn new(shadow: S, heap: RedzoneFrontend<B, H>, reporter: R) -> KasanRuntime<S, B, H, R> {
        KasanRuntime {
            shadow,
            bounds: None,
            reporter,
            heap,
        }
    }

    /// Establishes the region bounds, clears the shadow map and marks the
    /// shadow region itself as reserved. Only the first call has any effect.
    pub fn initialize<L: ShadowLayout, M: MemorySystem>(
        &mut self,
        memory_system: &M,
    ) -> Result<ShadowBounds, KasanRuntimeError> {
        if let Some(bounds) = self.bounds {
            Err(KasanRuntimeError::AlreadyInitialized(bounds))?;
        }

        let bounds = ShadowBounds::new::<L, M>(memory_system);
        self.shadow
            .set_shadow(bounds.shadow_start, bounds.shadow_size(), 0);
        self.shadow.poison(
            bounds.shadow_start,
            bounds.shadow_size(),
            PoisonType::AsanReserved,
        );
        self.bounds = Some(bounds);
        Ok(bounds)
    }

    pub fn is_initialized(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<&ShadowBounds> {
        self.bounds.as_ref()
    }

    /// Returns the violation an access of `size` bytes at `addr` would
    /// cause, without reporting it.
    pub fn violation(
        &self,
        addr: GuestAddr,
        size: usize,
        is_write: bool,
        ip: GuestAddr,
    ) -> Option<Violation> {
        let bounds = self.bounds.as_ref()?;
        let shadow_addr = AccessValidator::new(&self.shadow, bounds).find_violation(addr, size)?;
        Some(Violation {
            addr,
            size,
            is_write,
            ip,
            shadow_addr,
            fault_addr: S::to_real(shadow_addr),
        })
    }

    /// Checks an access of `size` bytes at `addr`, reporting it if illegal.
    /// Returns whether the access is legal.
    pub fn check(&mut self, addr: GuestAddr, size: usize, is_write: bool, ip: GuestAddr) -> bool {
        let Some(violation) = self.violation(addr, size, is_write, ip) else {
            return true;
        };
        if let Some(bounds) = &self.bounds {
            self.reporter.report(&self.shadow, bounds, &violation);
        }
        false
    }

    pub fn alloc(&mut self, len: usize) -> Result<GuestAddr, RedzoneFrontendError<B>> {
        self.heap.alloc(&mut self.shadow, len)
    }

    pub fn dealloc(&mut self, addr: GuestAddr) -> Result<(), RedzoneFrontendError<B>> {
        self.heap.dealloc(&mut self.shadow, addr)
    }

    pub fn realloc(
        &mut self,
        addr: GuestAddr,
        len: usize,
    ) -> Result<GuestAddr, RedzoneFrontendError<B>> {
        self.heap.realloc(&mut self.shadow, addr, len)
    }

    pub fn register_globals(&mut self, globals: &[GlobalDescriptor]) {
        globals::register_globals(&mut self.shadow, globals);
    }

    pub fn unregister_globals(&mut self, globals: &[GlobalDescriptor]) {
        globals::unregister_globals(globals);
    }

    /// Writes `tag` to `len` shadow bytes at the shadow address `shadow_addr`.
    pub fn set_shadow(&mut self, shadow_addr: GuestAddr, len: usize, tag: u8) {
        self.shadow.set_shadow(shadow_addr, len, tag);
    }

    pub fn shadow(&self) -> &S {
        &self.shadow
    }

    pub fn shadow_mut(&mut self) -> &mut S {
        &mut self.shadow
    }

    pub fn heap(&self) -> &RedzoneFrontend<B, H> {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut RedzoneFrontend<B, H> {
        &mut self.heap
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KasanRuntimeError {
    #[error("Already initialized: {0:x?}")]
    AlreadyInitialized(ShadowBounds),
}
