//! Bare-metal integration tests for the physical frame allocator and kernel
//! heap, run under `--target aarch64-unknown-none` against real QEMU
//! memory. Architecture-independent logic for both subsystems is already
//! covered by host `#[test]`s in `src/mm/frame_allocator.rs` and
//! `src/mm/heap.rs`; what belongs here is behavior that needs the real
//! linker script and real physical addresses: the live `BootParams`, the
//! real bitmap storage region, and zero-fill on actual memory.

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(aranea_kernel::test_framework::test_runner)]
#![reexport_test_harness_main = "test_main"]

use aranea_kernel::mm::{self, BootParams};
use aranea_kernel::{serial_println, test_framework::test_panic_handler};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    test_main();
    loop {
        core::hint::spin_loop();
    }
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    test_panic_handler(info)
}

fn init_once() {
    let params = BootParams::from_linker_symbols();
    let _ = mm::init(&params);
}

#[test_case]
fn pmm_and_heap_bring_up_from_real_linker_symbols() {
    init_once();
    let pmm = mm::frame_allocator::stats();
    assert!(pmm.total_memory > 0);
    assert!(pmm.free_memory <= pmm.total_memory);

    let heap = mm::heap::stats();
    assert!(heap.block_count >= 1);
    serial_println!("[ok]");
}

#[test_case]
fn alloc_frame_zeroes_real_payload_p3() {
    init_once();
    let p = mm::frame_allocator::alloc_frame().expect("frame available");
    // SAFETY: bare-metal only; `p` is a real, identity-mapped frame this
    // test exclusively owns until it is freed below.
    let bytes = unsafe { core::slice::from_raw_parts(p as *const u8, aranea_kernel::config::PAGE_SIZE) };
    assert!(bytes.iter().all(|&b| b == 0));
    mm::frame_allocator::free_frame(p);
    serial_println!("[ok]");
}

#[test_case]
fn kmalloc_returns_real_writable_zeroed_memory() {
    init_once();
    let size = 256;
    let ptr = mm::heap::kmalloc(size).expect("heap has room");
    // SAFETY: `ptr` is a live, just-allocated `size`-byte payload.
    let bytes = unsafe { core::slice::from_raw_parts_mut(ptr, size) };
    assert!(bytes.iter().all(|&b| b == 0));
    bytes.fill(0xAA);
    assert!(bytes.iter().all(|&b| b == 0xAA));
    mm::heap::kfree(ptr);
    serial_println!("[ok]");
}

#[test_case]
fn kmalloc_kfree_round_trips_free_memory_p4() {
    init_once();
    let before = mm::heap::stats().free_bytes;

    let a = mm::heap::kmalloc(64).unwrap();
    let b = mm::heap::kmalloc(128).unwrap();
    mm::heap::kfree(a);
    mm::heap::kfree(b);

    assert_eq!(mm::heap::stats().free_bytes, before);
    serial_println!("[ok]");
}

#[test_case]
fn heap_grows_past_initial_preprovisioned_region() {
    init_once();
    let before_blocks = mm::heap::stats().block_count;

    // Large enough that first-fit against the pre-provisioned 4 pages
    // cannot satisfy it, forcing `expand_heap` to run again.
    let big = mm::heap::kmalloc(64 * 1024).expect("pmm has frames to grow into");
    assert!(mm::heap::stats().block_count >= before_blocks);
    mm::heap::kfree(big);
    serial_println!("[ok]");
}

#[test_case]
fn frame_alloc_init_rejects_double_init() {
    init_once();
    let params = BootParams::from_linker_symbols();
    assert!(mm::frame_allocator::frame_alloc_init(&params).is_err());
    serial_println!("[ok]");
}
