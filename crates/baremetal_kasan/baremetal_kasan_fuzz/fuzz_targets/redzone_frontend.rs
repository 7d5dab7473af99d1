#![no_main]

use std::sync::Once;

use baremetal_kasan::{
    GuestAddr,
    shadow::Shadow,
    test::{TestKasan, test_kasan},
};
use libfuzzer_sys::fuzz_target;
use log::info;

const MAX_LENGTH: usize = 0x3ff;
const MAX_ALLOCATIONS: usize = 16;

static INIT_ONCE: Once = Once::new();

fn kasan() -> TestKasan {
    INIT_ONCE.call_once(env_logger::init);
    test_kasan()
}

fn assert_allocated(kasan: &TestKasan, buf: GuestAddr, len: usize) {
    let head = kasan.heap().head_redzone_size();
    let tail = kasan.heap().tail_redzone_size();
    for i in buf - head..buf + len + tail {
        let expected = i < buf || i >= buf + len;
        let poisoned = kasan.shadow().is_poison(i, 1);
        assert_eq!(expected, poisoned, "buf: {buf:#x}, len: {len:#x}, i: {i:#x}");
    }
}

fuzz_target!(|data: Vec<u16>| {
    let mut kasan = kasan();
    let mut live = Vec::new();

    for len in data.iter().take(MAX_ALLOCATIONS) {
        let len = *len as usize & MAX_LENGTH;
        info!("len: {len:#x}");
        let buf = kasan.alloc(len).unwrap();
        assert_allocated(&kasan, buf, len);
        live.push((buf, len));
    }

    for (i, (buf, len)) in live.iter().enumerate() {
        if i % 2 == 0 {
            kasan.dealloc(*buf).unwrap();
            assert!(len == &0 || kasan.shadow().is_poison(*buf, *len));
        } else {
            let new_len = (len * 2) & MAX_LENGTH;
            let new_buf = kasan.realloc(*buf, new_len).unwrap();
            assert_allocated(&kasan, new_buf, new_len);
        }
    }
});
