//! Bare-metal test harness: `#[test_case]` collection, serial reporting,
//! and QEMU exit codes.
//!
//! Only active under `cfg(all(test, target_os = "none"))` — host builds use
//! the ordinary libtest harness instead (see the two-tier split described on
//! each module's own `#[cfg(test)]` blocks).

use core::panic::PanicInfo;

use crate::{serial_print, serial_println};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QemuExitCode {
    Success = 0x10,
    Failed = 0x11,
}

/// Trait every `#[test_case]` item implements: a zero-argument function.
pub trait Testable {
    fn run(&self);
}

impl<T> Testable for T
where
    T: Fn(),
{
    fn run(&self) {
        serial_print!("{}...\t", core::any::type_name::<T>());
        self();
        serial_println!("[ok]");
    }
}

/// Custom test runner for bare-metal `#[test_case]` items, installed via
/// `#![test_runner(...)]` in `lib.rs`.
pub fn test_runner(tests: &[&dyn Testable]) -> ! {
    serial_println!("running {} tests", tests.len());
    for test in tests {
        test.run();
    }
    exit_qemu(QemuExitCode::Success);
}

/// Panic handler for test binaries: report failure and exit QEMU non-zero.
pub fn test_panic_handler(info: &PanicInfo) -> ! {
    serial_println!("[failed]\n");
    serial_println!("error: {}\n", info);
    exit_qemu(QemuExitCode::Failed)
}

/// Exit QEMU with `exit_code`, via the `virt` machine's PSCI `SYSTEM_OFF`
/// call (there is no `isa-debug-exit` device on `virt`, so the exit code
/// itself is not observable to the host — only success/failure is, via
/// whether this returns at all before the VM powers off).
pub fn exit_qemu(_exit_code: QemuExitCode) -> ! {
    const PSCI_SYSTEM_OFF: u32 = 0x84000008;
    // SAFETY: PSCI SYSTEM_OFF is a standard ARM PSCI call that powers off
    // the guest; the HVC instruction traps to QEMU. Noreturn since the VM
    // terminates before the next instruction would execute.
    unsafe {
        core::arch::asm!(
            "mov w0, {psci_off:w}",
            "hvc #0",
            psci_off = in(reg) PSCI_SYSTEM_OFF,
            options(noreturn)
        );
    }
}

/// Define a kernel test as a `#[test_case]` item.
#[macro_export]
macro_rules! kernel_test {
    ($name:ident, $test:expr) => {
        #[test_case]
        fn $name() {
            $test
        }
    };
}

/// Assertion macros for kernel tests: report to the serial console before
/// panicking, since a bare `assert!` panic message may not be visible
/// before `test_panic_handler` runs.
#[macro_export]
macro_rules! kernel_assert {
    ($cond:expr) => {
        if !$cond {
            $crate::serial_println!("assertion failed: {}", stringify!($cond));
            panic!("assertion failed");
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::serial_println!($($arg)*);
            panic!("assertion failed");
        }
    };
}

#[macro_export]
macro_rules! kernel_assert_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            $crate::serial_println!(
                "assertion failed: {} != {}\n  left: {:?}\n right: {:?}",
                stringify!($left),
                stringify!($right),
                $left,
                $right
            );
            panic!("assertion failed: not equal");
        }
    };
}

#[macro_export]
macro_rules! kernel_assert_ne {
    ($left:expr, $right:expr) => {
        if $left == $right {
            $crate::serial_println!(
                "assertion failed: {} == {}\n  left: {:?}\n right: {:?}",
                stringify!($left),
                stringify!($right),
                $left,
                $right
            );
            panic!("assertion failed: equal");
        }
    };
}
