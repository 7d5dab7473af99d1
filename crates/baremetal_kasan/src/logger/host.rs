//! # host
//! Forwards log records to the diagnostic sink of the host environment by
//! means of `kasan_log_write`.
use core::ffi::c_uint;

use log::{Level, LevelFilter};
use spin::Once;

use crate::{
    kasan_log_write,
    logger::{DiagnosticSink, Severity, SinkLogger},
};

#[derive(Debug, Default)]
pub struct HostSink;

impl DiagnosticSink for HostSink {
    fn write(&self, category: &str, severity: Severity, message: &str) {
        unsafe {
            kasan_log_write(
                category.as_ptr(),
                category.len(),
                severity as c_uint,
                message.as_ptr(),
                message.len(),
            )
        };
    }
}

static LOGGER: SinkLogger<HostSink> = SinkLogger::new(HostSink, Level::Info);
static ONCE: Once<()> = Once::new();

pub fn initialize() {
    ONCE.call_once(|| {
        // The host may already have installed a logger of its own.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Info);
        }
    });
}
