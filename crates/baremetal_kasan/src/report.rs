//! # report
//! Diagnostics for detected violations. A report consists of a header naming
//! the faulting access followed by a dump of the shadow memory surrounding
//! the first violating shadow byte, with that byte delimited by brackets:
//!
//! ```text
//! Invalid memory access: address 0x10010, size 0x1, is_write 1, ip 0x80424
//! Shadow bytes around the buggy address 0x10010 (shadow 0x102002):
//! 0x101FF0: 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00
//! 0x102000: FA FA[FB]FB FB FB 00 00 00 00 00 00 00 00 00 00
//! ```
//!
//! Reporting never halts execution, it is up to the caller what to do next.
use core::fmt;

use log::error;

use crate::{
    GuestAddr,
    lifecycle::ShadowBounds,
    shadow::{Shadow, describe_shadow_byte},
};

pub const SHADOW_ROW_SIZE: usize = 16;

pub const REPORT_TARGET: &str = "kasan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    /// Start of the access.
    pub addr: GuestAddr,
    pub size: usize,
    pub is_write: bool,
    /// Return address of the instrumented call.
    pub ip: GuestAddr,
    /// The first shadow byte found to be violated.
    pub shadow_addr: GuestAddr,
    /// The real address corresponding to `shadow_addr`.
    pub fault_addr: GuestAddr,
}

pub trait Report {
    fn report<S: Shadow>(&mut self, shadow: &S, bounds: &ShadowBounds, violation: &Violation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// Number of shadow rows printed before the row of the violation.
    pub rows_before: usize,
    /// Number of shadow rows printed after the row of the violation.
    pub rows_after: usize,
}

impl ReportConfig {
    pub const DEFAULT_ROWS: usize = 3;

    pub const fn new(rows_before: usize, rows_after: usize) -> ReportConfig {
        ReportConfig {
            rows_before,
            rows_after,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig::new(Self::DEFAULT_ROWS, Self::DEFAULT_ROWS)
    }
}

/// One row of the shadow dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowRow {
    pub shadow_addr: GuestAddr,
    pub bytes: [u8; SHADOW_ROW_SIZE],
    /// Index of the violating byte, if it lies within this row.
    pub marked: Option<usize>,
}

impl ShadowRow {
    pub fn read<S: Shadow>(shadow: &S, shadow_addr: GuestAddr, marked: Option<usize>) -> ShadowRow {
        let mut bytes = [0u8; SHADOW_ROW_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = shadow.load(shadow_addr + i);
        }
        ShadowRow {
            shadow_addr,
            bytes,
            marked,
        }
    }
}

impl fmt::Display for ShadowRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}:", self.shadow_addr)?;
        for (i, b) in self.bytes.iter().enumerate() {
            match self.marked {
                Some(m) if m == i => write!(f, "[{b:02X}]")?,
                Some(m) if m + 1 == i => write!(f, "{b:02X}")?,
                _ => write!(f, " {b:02X}")?,
            }
        }
        Ok(())
    }
}

/// Returns the rows of the shadow dump around `shadow_addr`. Rows which are not
/// wholly inside the shadow region are omitted.
pub fn shadow_rows<'a, S: Shadow>(
    shadow: &'a S,
    bounds: &'a ShadowBounds,
    shadow_addr: GuestAddr,
    config: &ReportConfig,
) -> impl Iterator<Item = ShadowRow> + use<'a, S> {
    let row = shadow_addr & !(SHADOW_ROW_SIZE - 1);
    let marked = shadow_addr - row;
    let first = row.saturating_sub(config.rows_before * SHADOW_ROW_SIZE);
    let count = (row - first) / SHADOW_ROW_SIZE + 1 + config.rows_after;
    (0..count)
        .map(move |i| first + i * SHADOW_ROW_SIZE)
        .filter(move |addr| {
            bounds.shadow_start <= *addr
                && addr
                    .checked_add(SHADOW_ROW_SIZE)
                    .is_some_and(|end| end <= bounds.shadow_end)
        })
        .map(move |addr| ShadowRow::read(shadow, addr, (addr == row).then_some(marked)))
}

/// Emits reports through the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter {
    config: ReportConfig,
}

impl LogReporter {
    pub const fn new(config: ReportConfig) -> LogReporter {
        LogReporter { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }
}

impl Report for LogReporter {
    fn report<S: Shadow>(&mut self, shadow: &S, bounds: &ShadowBounds, violation: &Violation) {
        error!(target: REPORT_TARGET, "===================================================");
        error!(
            target: REPORT_TARGET,
            "Invalid memory access: address {:#x}, size {:#x}, is_write {}, ip {:#x}",
            violation.addr,
            violation.size,
            violation.is_write as u8,
            violation.ip
        );
        let tag = shadow.load(violation.shadow_addr);
        error!(
            target: REPORT_TARGET,
            "Shadow byte {tag:#04x} ({}) at {:#x}",
            describe_shadow_byte(tag),
            violation.fault_addr
        );
        error!(
            target: REPORT_TARGET,
            "Shadow bytes around the buggy address {:#x} (shadow {:#x}):",
            violation.fault_addr,
            violation.shadow_addr
        );
        for row in shadow_rows(shadow, bounds, violation.shadow_addr, &self.config) {
            error!(target: REPORT_TARGET, "{row}");
        }
    }
}
