#[cfg(test)]
mod tests {
    use baremetal_kasan::logger::{DiagnosticSink, LINE_BUFFER_SIZE, Severity, SinkLogger};
    use log::{Level, Log, Record};
    use spin::Mutex;

    #[derive(Debug, Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(String, Severity, String)>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn write(&self, category: &str, severity: Severity, message: &str) {
            self.lines
                .lock()
                .push((category.to_string(), severity, message.to_string()));
        }
    }

    fn logger() -> SinkLogger<RecordingSink> {
        SinkLogger::new(RecordingSink::default(), Level::Info)
    }

    #[test]
    fn test_forwards_records() {
        let logger = logger();
        logger.log(
            &Record::builder()
                .args(format_args!("Invalid memory access: address {:#x}", 0x10048))
                .level(Level::Error)
                .target("kasan")
                .build(),
        );
        let lines = logger.sink().lines.lock();
        assert_eq!(
            lines.as_slice(),
            &[(
                "kasan".to_string(),
                Severity::Error,
                "Invalid memory access: address 0x10048".to_string()
            )]
        );
    }

    #[test]
    fn test_filters_below_level() {
        let logger = logger();
        logger.log(
            &Record::builder()
                .args(format_args!("alloc - len: 0x10"))
                .level(Level::Debug)
                .target("kasan")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("initialize"))
                .level(Level::Info)
                .target("kasan")
                .build(),
        );
        let lines = logger.sink().lines.lock();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, Severity::Notice);
    }

    #[test]
    fn test_truncates_long_lines() {
        let logger = logger();
        let long = "x".repeat(LINE_BUFFER_SIZE * 2);
        logger.log(
            &Record::builder()
                .args(format_args!("{long}"))
                .level(Level::Warn)
                .target("kasan")
                .build(),
        );
        let lines = logger.sink().lines.lock();
        assert_eq!(lines[0].1, Severity::Warning);
        assert_eq!(lines[0].2.len(), LINE_BUFFER_SIZE);
    }
}
