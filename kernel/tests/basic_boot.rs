//! Smoke test: the kernel boots, installs its exception vectors, and can
//! write to the serial console without faulting.

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(aranea_kernel::test_framework::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;

use aranea_kernel::{serial_println, test_framework::test_panic_handler};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    test_main();
    loop {
        core::hint::spin_loop();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    test_panic_handler(info)
}

#[test_case]
fn console_writes_without_faulting() {
    serial_println!("console is alive");
}

#[test_case]
fn exception_vectors_are_installed() {
    aranea_kernel::arch::init();
    serial_println!("vectors installed");
}

#[test_case]
fn memory_subsystem_brings_up_clean() {
    let params = aranea_kernel::mm::BootParams::from_linker_symbols();
    aranea_kernel::mm::init(&params).expect("memory init must succeed on first boot");
    serial_println!("memory subsystem up");
}
