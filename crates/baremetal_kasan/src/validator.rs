//! # validator
//! Decides whether an access to `[addr, addr + size)` is legal.
//!
//! A non-zero shadow byte either marks an inaccessible granule, or a granule
//! of which only the first `n` bytes are accessible. The latter may only
//! legitimately occur for the final granule of an access, and then only if
//! the access ends within those first `n` bytes.
use log::trace;

use crate::{
    GuestAddr,
    lifecycle::ShadowBounds,
    shadow::{SHADOW_MASK, SHADOW_UNPOISONED, Shadow},
};

/// Returns the shadow address of the first shadow byte which makes the access
/// `[addr, addr + size)` illegal, if any.
pub fn first_poisoned<S: Shadow>(shadow: &S, addr: GuestAddr, size: usize) -> Option<GuestAddr> {
    if size == 0 {
        return None;
    }
    let last = addr.checked_add(size - 1)?;
    let shadow_start = S::to_shadow(addr);
    let last_shadow = S::to_shadow(last);

    let poisoned = (shadow_start..=last_shadow).find(|s| shadow.load(*s) != SHADOW_UNPOISONED)?;
    if poisoned != last_shadow {
        return Some(poisoned);
    }

    // Red-zone tags are negative when taken as signed, so any offset exceeds
    // them. Partial granule counts are in `1..=7`.
    let accessible = shadow.load(last_shadow) as i8;
    if (last & SHADOW_MASK) as i8 >= accessible {
        Some(poisoned)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct AccessValidator<'a, S: Shadow> {
    shadow: &'a S,
    bounds: &'a ShadowBounds,
}

impl<'a, S: Shadow> AccessValidator<'a, S> {
    pub fn new(shadow: &'a S, bounds: &'a ShadowBounds) -> AccessValidator<'a, S> {
        AccessValidator { shadow, bounds }
    }

    /// Accesses which need no shadow lookup: empty accesses, accesses within
    /// the shadow region or the I/O window and accesses reaching beyond high
    /// memory.
    pub fn is_unchecked(&self, addr: GuestAddr, size: usize) -> bool {
        if size == 0 {
            return true;
        }
        let Some(last) = addr.checked_add(size - 1) else {
            return true;
        };
        self.bounds.is_shadow(addr, last)
            || self.bounds.is_io(addr, last)
            || self.bounds.is_beyond_high_mem(last)
    }

    /// Returns the violating shadow address for an illegal access.
    pub fn find_violation(&self, addr: GuestAddr, size: usize) -> Option<GuestAddr> {
        if self.is_unchecked(addr, size) {
            trace!("unchecked - addr: {addr:#x}, size: {size:#x}");
            return None;
        }
        first_poisoned(self.shadow, addr, size)
    }
}
