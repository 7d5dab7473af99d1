#[cfg(test)]
#[cfg(feature = "test")]
mod tests {
    use baremetal_kasan::{
        GuestAddr,
        runtime::KasanRuntimeError,
        shadow::{PoisonType, Shadow},
        test::{
            TEST_MEMORY_SYSTEM, TestKasan, TestLayout, TestShadow, test_kasan, uninitialized_kasan,
        },
    };

    const IP: GuestAddr = 0x8_0424;

    fn kasan() -> TestKasan {
        let _ = env_logger::builder().is_test(true).try_init();
        test_kasan()
    }

    #[test]
    fn test_uninitialized_accepts_everything() {
        let mut kasan = uninitialized_kasan();
        assert!(!kasan.is_initialized());
        kasan
            .shadow_mut()
            .poison(0x5000, 0x40, PoisonType::AsanHeapFreed);
        assert!(kasan.check(0x5000, 8, false, IP));
        assert!(kasan.check(0x5008, 1, true, IP));
        assert!(kasan.reporter().violations().is_empty());
    }

    #[test]
    fn test_initialized_accepts_clean_memory() {
        let mut kasan = kasan();
        assert!(kasan.is_initialized());
        assert!(kasan.check(0x5000, 8, false, IP));
        assert!(kasan.check(0x5003, 0x100, true, IP));
    }

    #[test]
    fn test_zero_size_is_accepted() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x5000, 0x40, PoisonType::AsanHeapFreed);
        assert!(kasan.check(0x5000, 0, true, IP));
        assert!(kasan.reporter().violations().is_empty());
    }

    #[test]
    fn test_unchecked_regions() {
        let mut kasan = kasan();
        // Shadow region
        assert!(kasan.check(0x10_0000, 8, true, IP));
        assert!(kasan.check(0x13_fff8, 8, false, IP));
        // I/O window
        assert!(kasan.check(0x18_0000, 4, false, IP));
        assert!(kasan.check(0x1b_fffc, 4, true, IP));
        // Beyond high memory
        assert!(kasan.check(0x20_0000, 4, false, IP));
        assert!(kasan.check(0x1f_fffc, 8, false, IP));
        assert!(kasan.reporter().violations().is_empty());
    }

    #[test]
    fn test_access_straddling_into_shadow_region() {
        let mut kasan = kasan();
        assert!(!kasan.check(0xf_fff8, 16, false, IP));
        let violations = kasan.reporter().violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].fault_addr, 0x10_0000);
        assert_eq!(
            kasan.shadow().load(violations[0].shadow_addr),
            PoisonType::AsanReserved as u8
        );
    }

    #[test]
    fn test_poison_unpoison_restores() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x5000, 32, PoisonType::AsanStackUseAfterScope);
        assert!(kasan.shadow().is_poison(0x5000, 32));
        assert!(!kasan.check(0x5010, 4, false, IP));
        kasan.shadow_mut().unpoison(0x5000, 32);
        assert!(!kasan.shadow().is_poison(0x5000, 32));
        assert!(kasan.check(0x5010, 4, false, IP));
    }

    #[test]
    fn test_partial_granule() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x3000, 0x20, PoisonType::AsanGlobalRz);
        kasan.shadow_mut().unpoison(0x3000, 13);

        assert!(kasan.check(0x3000, 13, false, IP));
        assert!(kasan.check(0x3004, 8, false, IP));
        assert!(kasan.check(0x300c, 1, false, IP));
        assert!(!kasan.check(0x300d, 1, false, IP));
        assert!(!kasan.check(0x3008, 8, false, IP));
        assert!(!kasan.check(0x300c, 8, false, IP));
        assert_eq!(kasan.reporter().violations().len(), 3);
    }

    #[test]
    fn test_violation_details() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x6000, 0x10, PoisonType::AsanStackLeftRz);
        kasan.shadow_mut().unpoison(0x6000, 4);
        assert!(!kasan.check(0x6002, 4, true, IP));

        let violation = kasan.reporter().violations()[0];
        assert_eq!(violation.addr, 0x6002);
        assert_eq!(violation.size, 4);
        assert!(violation.is_write);
        assert_eq!(violation.ip, IP);
        assert_eq!(violation.shadow_addr, TestShadow::to_shadow(0x6000));
        assert_eq!(violation.fault_addr, 0x6000);
    }

    #[test]
    fn test_violation_is_not_reported() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x7000, 0x10, PoisonType::AsanHeapFreed);
        let violation = kasan.violation(0x7004, 2, false, IP).unwrap();
        assert_eq!(violation.fault_addr, 0x7000);
        assert!(kasan.reporter().violations().is_empty());
        assert_eq!(kasan.violation(0x7010, 8, false, IP), None);

        assert!(!kasan.check(0x7004, 2, false, IP));
        assert_eq!(kasan.reporter().violations(), &[violation]);
    }

    #[test]
    fn test_uninitialized_finds_no_violation() {
        let mut kasan = uninitialized_kasan();
        kasan
            .shadow_mut()
            .poison(0x7000, 0x10, PoisonType::AsanHeapFreed);
        assert_eq!(kasan.violation(0x7000, 1, true, IP), None);
    }

    #[test]
    fn test_set_shadow_for_stack() {
        let mut kasan = kasan();
        let shadow_addr = TestShadow::to_shadow(0x2000);
        kasan.set_shadow(shadow_addr, 4, PoisonType::AsanStackLeftRz as u8);
        assert!(!kasan.check(0x2000, 1, false, IP));
        assert!(!kasan.check(0x201f, 1, false, IP));
        assert!(kasan.check(0x2020, 1, false, IP));

        kasan.set_shadow(shadow_addr, 4, 0);
        assert!(kasan.check(0x2000, 0x20, false, IP));
        assert_eq!(kasan.reporter().violations().len(), 2);
    }

    #[test]
    fn test_second_initialize_is_ignored() {
        let mut kasan = kasan();
        kasan
            .shadow_mut()
            .poison(0x5000, 8, PoisonType::AsanHeapFreed);
        let bounds = *kasan.bounds().unwrap();
        let result = kasan.initialize::<TestLayout, _>(&TEST_MEMORY_SYSTEM);
        assert!(matches!(result, Err(KasanRuntimeError::AlreadyInitialized(b)) if b == bounds));
        assert_eq!(kasan.bounds(), Some(&bounds));
        assert!(!kasan.check(0x5000, 1, false, IP));
    }

    #[test]
    fn test_bounds() {
        let kasan = kasan();
        let bounds = kasan.bounds().unwrap();
        assert_eq!(bounds.shadow_start, 0x10_0000);
        assert_eq!(bounds.shadow_end, 0x14_0000);
        assert_eq!(bounds.low_mem_end, 0x18_0000);
        assert_eq!(bounds.high_mem_start, 0x1c_0000);
        assert_eq!(bounds.high_mem_end, 0x20_0000);
    }

    #[test]
    fn test_bounds_display_on_one_line() {
        let kasan = kasan();
        let bounds = kasan.bounds().unwrap();
        let line = format!("{bounds:x?}");
        assert!(!line.contains('\n'));
        assert!(line.contains("shadow_start: 100000"));

        let e = KasanRuntimeError::AlreadyInitialized(*bounds);
        assert!(!e.to_string().contains('\n'));
    }
}
