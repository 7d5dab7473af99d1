#![no_main]

use baremetal_kasan::{
    GuestAddr,
    shadow::{PoisonType, SHADOW_GRANULE_SIZE, Shadow},
    test::{TestShadow, test_kasan},
};
use libfuzzer_sys::fuzz_target;

const REGION: GuestAddr = 0x4000;
const REGION_LEN: usize = 0x400;

fuzz_target!(|data: (u16, u16, u16)| {
    let mut kasan = test_kasan();
    let (valid, offset, size) = data;
    let valid = valid as usize % REGION_LEN;
    let offset = offset as usize % REGION_LEN;
    let size = size as usize % (REGION_LEN - offset);

    kasan
        .shadow_mut()
        .poison(REGION, REGION_LEN, PoisonType::AsanGlobalRz);
    kasan.shadow_mut().unpoison(REGION, valid);

    let accepted = kasan.check(REGION + offset, size, false, 0);
    let expected = size == 0 || offset + size <= valid;
    assert_eq!(
        accepted, expected,
        "valid: {valid:#x}, offset: {offset:#x}, size: {size:#x}, shadow: {:#x}",
        kasan.shadow().load(TestShadow::to_shadow(REGION + (valid & !(SHADOW_GRANULE_SIZE - 1))))
    );
});
