#[cfg(test)]
#[cfg(all(feature = "test", feature = "hooks", target_os = "linux"))]
mod tests {
    use core::ffi::c_void;
    use std::ptr::null_mut;

    use baremetal_kasan::{
        GuestAddr,
        hooks::{
            access::{__asan_load1_noabort, __asan_loadN_noabort, __asan_store1_noabort},
            heap::{kasan_allocate_hook, kasan_free_hook, kasan_reallocate_hook},
        },
        logger::Severity,
        test::host::{
            HOST_HEAP_SIZE, HOST_HEAP_START, LogLine, initialize_host, lock_host,
            set_heap_failure, take_log,
        },
    };
    use spin::MutexGuard;

    fn setup() -> MutexGuard<'static, ()> {
        let guard = lock_host();
        initialize_host();
        take_log();
        guard
    }

    fn reports(log: &[LogLine]) -> usize {
        log.iter()
            .filter(|l| l.message.starts_with("Invalid memory access"))
            .count()
    }

    fn errors(log: &[LogLine]) -> Vec<&LogLine> {
        log.iter()
            .filter(|l| l.severity == Severity::Error as u32)
            .collect()
    }

    #[test]
    fn test_allocate_in_heap() {
        let _guard = setup();
        let p = kasan_allocate_hook(24) as GuestAddr;
        assert!(p > HOST_HEAP_START && p < HOST_HEAP_START + HOST_HEAP_SIZE);
        assert_eq!(p % 8, 0);
        __asan_loadN_noabort(p, 24);
        assert_eq!(reports(&take_log()), 0);

        __asan_load1_noabort(p - 1);
        __asan_load1_noabort(p + 24);
        assert_eq!(reports(&take_log()), 2);
    }

    #[test]
    fn test_use_after_free() {
        let _guard = setup();
        let p = kasan_allocate_hook(32);
        unsafe { kasan_free_hook(p) };
        __asan_store1_noabort(p as GuestAddr + 8);
        let log = take_log();
        assert_eq!(reports(&log), 1);
        assert!(log.iter().any(|l| l.message.contains("(freed heap region)")));
    }

    #[test]
    fn test_reallocate_moves() {
        let _guard = setup();
        let p = kasan_allocate_hook(8);
        unsafe { (p as *mut u64).write(0x1122_3344_5566_7788) };

        let q = unsafe { kasan_reallocate_hook(p, 40) };
        assert!(!q.is_null());
        assert_ne!(p, q);
        assert_eq!(unsafe { (q as *const u64).read() }, 0x1122_3344_5566_7788);
        __asan_loadN_noabort(q as GuestAddr, 40);
        assert_eq!(reports(&take_log()), 0);

        __asan_load1_noabort(p as GuestAddr);
        assert_eq!(reports(&take_log()), 1);
    }

    #[test]
    fn test_reallocate_null_allocates() {
        let _guard = setup();
        let p = unsafe { kasan_reallocate_hook(null_mut(), 16) };
        assert!(!p.is_null());
        __asan_loadN_noabort(p as GuestAddr, 16);
        assert!(take_log().is_empty());
    }

    #[test]
    fn test_free_null() {
        let _guard = setup();
        unsafe { kasan_free_hook(null_mut()) };
        assert!(take_log().is_empty());
    }

    #[test]
    fn test_out_of_memory_is_silent() {
        let _guard = setup();
        let p = kasan_allocate_hook(16);

        set_heap_failure(true);
        let failed = kasan_allocate_hook(16);
        let resized = unsafe { kasan_reallocate_hook(p, 64) };
        set_heap_failure(false);

        assert!(failed.is_null());
        assert!(resized.is_null());
        assert!(take_log().is_empty());
    }

    #[test]
    fn test_size_overflow_is_logged() {
        let _guard = setup();
        assert!(kasan_allocate_hook(usize::MAX).is_null());
        let log = take_log();
        let errors = errors(&log);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("allocate - "));
    }

    #[test]
    fn test_free_invalid_address_is_logged() {
        let _guard = setup();
        unsafe { kasan_free_hook(8 as *mut c_void) };
        let log = take_log();
        let errors = errors(&log);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("free - "));
        assert!(!errors[0].message.contains('\n'));
    }
}
