//! # logger
//! This module provides an implementation of a logger which forwards the
//! records of the `log` facade to a line oriented diagnostic sink, as found
//! on bare-metal platforms (a serial console or a screen). Records are
//! formatted into a fixed size buffer on the stack, since the heap may be the
//! very thing being sanitized.
#[cfg(feature = "hooks")]
pub mod host;

use core::fmt::{self, Write};

use log::{Level, Log, Metadata, Record};

pub const LINE_BUFFER_SIZE: usize = 256;

/// The severities understood by the diagnostic sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Severity {
    Panic = 0,
    Error = 1,
    Warning = 2,
    Notice = 3,
    Debug = 4,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => Severity::Error,
            Level::Warn => Severity::Warning,
            Level::Info => Severity::Notice,
            Level::Debug | Level::Trace => Severity::Debug,
        }
    }
}

pub trait DiagnosticSink {
    fn write(&self, category: &str, severity: Severity, message: &str);
}

/// A line of text which silently truncates once full.
#[derive(Debug)]
pub struct LineBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> LineBuffer<N> {
        LineBuffer {
            buf: [0; N],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Write for LineBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut take = s.len().min(N - self.len);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SinkLogger<W: DiagnosticSink> {
    level: Level,
    sink: W,
}

impl<W: DiagnosticSink> SinkLogger<W> {
    pub const fn new(sink: W, level: Level) -> SinkLogger<W> {
        SinkLogger { level, sink }
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }
}

impl<W: DiagnosticSink + Send + Sync> Log for SinkLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.level >= metadata.level()
    }

    fn flush(&self) {}

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut line = LineBuffer::<LINE_BUFFER_SIZE>::new();
            let _ = write!(line, "{}", record.args());
            self.sink.write(
                record.metadata().target(),
                record.metadata().level().into(),
                line.as_str(),
            );
        }
    }
}
