//! # hooks
//! The `extern "C"` entry points called by compiler generated code and by the
//! platform allocator. All hooks share one statically initialized runtime.
//!
//! The runtime is constructed in a `const` context, no code runs on first
//! use. The lock around it is never held while a record is logged, so the
//! diagnostic sink may allocate or be instrumented itself. Access checks only
//! ever `try_lock` it, an access made while the runtime is busy is accepted
//! unchecked.
use log::{info, warn};
use spin::Mutex;

use crate::{
    GuestAddr,
    allocator::{
        backend::host::HostBackend,
        frontend::redzone::{RedzoneFrontend, RedzoneSizes},
    },
    kasan_high_mem_size, kasan_low_mem_size, kasan_shadow_mem_size,
    lifecycle::MemorySystem,
    logger,
    mem::raw::RawMemory,
    report::{LogReporter, Report, ReportConfig},
    runtime::KasanRuntime,
    shadow::{
        ShadowLayout,
        guest::{DefaultShadowLayout, GuestShadow},
    },
};

pub mod access;
pub mod heap;

#[cfg(feature = "mem_hooks")]
pub mod mem;

pub type BareMetalShadow = GuestShadow<RawMemory, DefaultShadowLayout>;

pub type BareMetalKasan = KasanRuntime<BareMetalShadow, HostBackend, RawMemory, LogReporter>;

const REDZONES: RedzoneSizes = match RedzoneSizes::new(
    DefaultShadowLayout::HEAP_BLOCK_ALIGN,
    RedzoneSizes::DEFAULT_TAIL_REDZONE_SIZE,
) {
    Ok(redzones) => redzones,
    Err(_) => panic!("KASAN_HEAP_BLOCK_ALIGN is not a valid head red-zone size"),
};

static KASAN: Mutex<BareMetalKasan> = Mutex::new(KasanRuntime::new(
    GuestShadow::new(unsafe { RawMemory::new() }),
    RedzoneFrontend::new(HostBackend, unsafe { RawMemory::new() }, REDZONES),
    LogReporter::new(ReportConfig::new(
        ReportConfig::DEFAULT_ROWS,
        ReportConfig::DEFAULT_ROWS,
    )),
));

/// Queries the region sizes from the host environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMemorySystem;

impl MemorySystem for HostMemorySystem {
    fn shadow_mem_size(&self) -> usize {
        unsafe { kasan_shadow_mem_size() }
    }

    fn low_mem_size(&self) -> usize {
        unsafe { kasan_low_mem_size() }
    }

    fn high_mem_size(&self) -> usize {
        unsafe { kasan_high_mem_size() }
    }
}

/// Enables checking. Must be called once the memory system can report the
/// region sizes and before the heap is first used. Later calls are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn kasan_initialize() {
    logger::host::initialize();
    let result = KASAN
        .lock()
        .initialize::<DefaultShadowLayout, _>(&HostMemorySystem);
    match result {
        Ok(bounds) => info!("initialize - bounds: {bounds:x?}"),
        Err(e) => warn!("initialize - {e}"),
    }
}

/// Validates the access under the lock and reports any violation once the
/// lock has been released, reading the shadow map directly.
#[inline]
fn check(addr: GuestAddr, size: usize, is_write: bool, ip: GuestAddr) {
    let found = KASAN.try_lock().and_then(|kasan| {
        let bounds = *kasan.bounds()?;
        let violation = kasan.violation(addr, size, is_write, ip)?;
        Some((bounds, violation, *kasan.reporter()))
    });
    if let Some((bounds, violation, mut reporter)) = found {
        let shadow = BareMetalShadow::new(unsafe { RawMemory::new() });
        reporter.report(&shadow, &bounds, &violation);
    }
}
