//! Kernel console: a single PL011 instance shared behind a spinlock.

use core::fmt::{self, Write};

use spin::Mutex;

use crate::arch::aarch64::pl011::Pl011;
use crate::config;

static CONSOLE: Mutex<Pl011> = Mutex::new(
    // SAFETY: `UART0_BASE` is the PL011 MMIO window QEMU's `virt` machine
    // maps at a fixed address; no other code touches this range.
    unsafe { Pl011::new(config::UART0_BASE) },
);

/// Program the console's baud rate and frame format. Must run once, before
/// any other kernel code writes through [`_print`].
pub fn init() {
    CONSOLE.lock().init();
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    CONSOLE
        .lock()
        .write_fmt(args)
        .expect("write to PL011 console cannot fail");
}

/// Non-blocking read of one byte from the console, if any is queued.
pub fn try_read_byte() -> Option<u8> {
    CONSOLE.lock().getc()
}

#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => {
        $crate::serial_print!("{}\n", format_args!($($arg)*))
    };
}
