//! # arch
//! Architecture specific support for the instrumentation hooks.
use crate::GuestAddr;

/// Returns the return address of the enclosing function. This must be inlined
/// into a hook and called before the hook makes any call of its own, since
/// the link register is clobbered by the first call.
#[inline(always)]
pub fn return_address() -> GuestAddr {
    let addr: GuestAddr;
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("mov {}, x30", out(reg) addr, options(nomem, nostack, preserves_flags));
    }
    #[cfg(target_arch = "arm")]
    unsafe {
        core::arch::asm!("mov {}, lr", out(reg) addr, options(nomem, nostack, preserves_flags));
    }
    #[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
    {
        addr = 0;
    }
    addr
}
