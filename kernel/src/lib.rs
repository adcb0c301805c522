//! Aranea kernel library.
//!
//! Exposes every module as a library crate so both the bare-metal binary
//! (`main.rs`) and the host test harness can build against the same code.
//! On a genuine `aarch64-unknown-none` target this is a `#![no_std]` kernel
//! with its own global allocator; on the host test target (no default
//! target is configured, so plain `cargo test` builds and runs this crate
//! against the dev machine's own triple) `std` is linked instead, giving
//! `#[test]`/libtest their usual behavior and `alloc` a allocator for free.

#![no_std]
#![cfg_attr(all(test, target_os = "none"), no_main)]
#![feature(custom_test_frameworks)]
#![cfg_attr(target_os = "none", feature(alloc_error_handler))]
#![cfg_attr(target_os = "none", test_runner(crate::test_framework::test_runner))]
#![cfg_attr(target_os = "none", reexport_test_harness_main = "test_main")]

extern crate alloc;

#[cfg(not(target_os = "none"))]
extern crate std;

#[cfg(target_os = "none")]
#[global_allocator]
static ALLOCATOR: mm::KernelHeapAllocator = mm::KernelHeapAllocator;

#[cfg(not(target_os = "none"))]
#[global_allocator]
static ALLOCATOR: std::alloc::System = std::alloc::System;

#[macro_use]
pub mod print;

#[cfg(target_arch = "aarch64")]
pub mod arch;
#[cfg(target_arch = "aarch64")]
pub mod bootstrap;
pub mod config;
pub mod error;
mod intrinsics;
pub mod log_service;
pub mod mm;
#[cfg(target_arch = "aarch64")]
pub mod serial;
pub mod sync;
#[cfg(target_arch = "aarch64")]
pub mod test_framework;

#[cfg(all(test, target_os = "none"))]
pub use test_framework::{exit_qemu, QemuExitCode, Testable};

/// Kernel entry point, called from the boot trampoline once `.bss` is
/// zeroed. Never returns.
#[cfg(target_arch = "aarch64")]
pub fn kernel_main() -> ! {
    bootstrap::kernel_init()
}

#[cfg(all(test, target_os = "none"))]
#[no_mangle]
pub extern "C" fn _start() -> ! {
    test_main();
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(all(test, target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    test_framework::test_panic_handler(info)
}

/// Heap allocation error handler.
///
/// Panic is intentional: heap allocation failure in a no_std kernel is
/// unrecoverable. The alloc_error_handler ABI requires `-> !`.
#[cfg(target_os = "none")]
#[alloc_error_handler]
fn alloc_error_handler(layout: core::alloc::Layout) -> ! {
    panic!("allocation error: {:?}", layout);
}
