use std::{env, fs, path::Path};

// Memory map of the reference platform (Raspberry Pi, Circle):
// || `[0x40000000, 0x40000000 + high)`   || HighMem   ||
// || `[low, 0x40000000)`                 || I/O, GPU  ||
// || `[0x00000000, low)`                 || LowMem    ||
// The shadow region lives inside LowMem at `KASAN_SHADOW_OFFSET`.
const DEFAULT_SHADOW_OFFSET: u64 = 0x0400_0000;
const DEFAULT_HIGH_MEM_OFFSET: u64 = 0x4000_0000;
const DEFAULT_HEAP_BLOCK_ALIGN: u64 = 64;

const LAYOUT_TEMPLATE: &str = r#"
use crate::GuestAddr;
use super::super::ShadowLayout;

#[derive(Debug)]
pub struct DefaultShadowLayout;

impl ShadowLayout for DefaultShadowLayout {
    const SHADOW_OFFSET: GuestAddr = {shadow_offset};
    const HIGH_MEM_OFFSET: GuestAddr = {high_mem_offset};
    const HEAP_BLOCK_ALIGN: usize = {heap_block_align};
}
"#;

fn parse(value: &str) -> Option<u64> {
    let value = value.trim().replace('_', "");
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn setting(name: &str, default: u64) -> u64 {
    println!("cargo:rerun-if-env-changed={name}");
    match env::var(name) {
        Ok(value) => parse(&value)
            .unwrap_or_else(|| panic!("{name} is not a valid address or size: {value:?}")),
        Err(_) => default,
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let shadow_offset = setting("KASAN_SHADOW_OFFSET", DEFAULT_SHADOW_OFFSET);
    let high_mem_offset = setting("KASAN_HIGH_MEM_OFFSET", DEFAULT_HIGH_MEM_OFFSET);
    let heap_block_align = setting("KASAN_HEAP_BLOCK_ALIGN", DEFAULT_HEAP_BLOCK_ALIGN);

    assert_eq!(
        shadow_offset % 8,
        0,
        "KASAN_SHADOW_OFFSET must be 8-byte aligned"
    );
    assert!(
        heap_block_align >= 8 && heap_block_align.is_power_of_two(),
        "KASAN_HEAP_BLOCK_ALIGN must be a power of two of at least 8"
    );

    let gen_layout = LAYOUT_TEMPLATE
        .to_string()
        .replace("{shadow_offset}", &format!("{shadow_offset:#x}"))
        .replace("{high_mem_offset}", &format!("{high_mem_offset:#x}"))
        .replace("{heap_block_align}", &format!("{heap_block_align:#x}"));

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("gen_layout.rs");
    fs::write(&dest_path, gen_layout).unwrap();
}
