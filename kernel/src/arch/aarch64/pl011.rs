//! PL011 UART driver.
//!
//! Full MMIO register block for the PL011 as wired up on QEMU's `virt`
//! machine (`0x0900_0000`), accessed through `volatile-register` wrappers so
//! every register access compiles to the single load/store the hardware
//! contract requires — no accidental re-reads or re-writes from the
//! optimizer.

use core::fmt;

use volatile_register::{RO, RW, WO};

use crate::config;

bitflags::bitflags! {
    /// Flag register (FR) bits relevant to polled I/O.
    struct Flags: u32 {
        /// Receive FIFO empty.
        const RXFE = 1 << 4;
        /// Transmit FIFO full.
        const TXFF = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Line control register (LCR_H) bits.
    struct LineControl: u32 {
        const FEN = 1 << 4;
        const WLEN_8BIT = 0b11 << 5;
    }
}

bitflags::bitflags! {
    /// Control register (CR) bits.
    struct Control: u32 {
        const UARTEN = 1 << 0;
        const TXE = 1 << 8;
        const RXE = 1 << 9;
    }
}

#[repr(C)]
struct RegisterBlock {
    /// 0x00 - Data Register
    dr: RW<u32>,
    /// 0x04 - Receive Status / Error Clear
    rsr: RW<u32>,
    _reserved0: [u32; 4],
    /// 0x18 - Flag Register
    fr: RO<u32>,
    _reserved1: u32,
    /// 0x20 - IrDA Low-Power Counter
    ilpr: RW<u32>,
    /// 0x24 - Integer Baud Rate
    ibrd: RW<u32>,
    /// 0x28 - Fractional Baud Rate
    fbrd: RW<u32>,
    /// 0x2C - Line Control
    lcr_h: RW<u32>,
    /// 0x30 - Control Register
    cr: RW<u32>,
    /// 0x34 - Interrupt FIFO Level Select
    ifls: RW<u32>,
    /// 0x38 - Interrupt Mask Set/Clear
    imsc: RW<u32>,
    /// 0x3C - Raw Interrupt Status
    ris: RO<u32>,
    /// 0x40 - Masked Interrupt Status
    mis: RO<u32>,
    /// 0x44 - Interrupt Clear
    icr: WO<u32>,
    /// 0x48 - DMA Control
    dmacr: RW<u32>,
}

/// A PL011 UART bound to a fixed MMIO base address.
pub struct Pl011 {
    regs: *mut RegisterBlock,
}

// SAFETY: all access goes through volatile register operations on a single
// MMIO device; there is exactly one hart and the driver is only ever
// reached through the `Mutex`-guarded global instance in `console`.
unsafe impl Send for Pl011 {}

impl Pl011 {
    /// Construct a driver bound to `base_addr`.
    ///
    /// # Safety
    /// `base_addr` must be the base of a real PL011 MMIO window, mapped and
    /// accessible for the lifetime of the returned value.
    pub const unsafe fn new(base_addr: usize) -> Self {
        Self {
            regs: base_addr as *mut RegisterBlock,
        }
    }

    fn regs(&self) -> &RegisterBlock {
        // SAFETY: `regs` was constructed from a valid MMIO base in `new`.
        unsafe { &*self.regs }
    }

    /// Program baud rate, frame format, and enable TX/RX with FIFOs.
    /// Masks all interrupts: the core does not wire the PL011 to the GIC.
    pub fn init(&mut self) {
        let r = self.regs();

        // SAFETY: single MMIO device, accessed under the console lock.
        unsafe {
            r.cr.write(0);

            let ibrd = config::UART_CLOCK_HZ / (16 * config::UART_BAUD_RATE);
            let remainder = config::UART_CLOCK_HZ % (16 * config::UART_BAUD_RATE);
            let fbrd = (remainder * 4 + config::UART_BAUD_RATE / 2) / config::UART_BAUD_RATE;
            r.ibrd.write(ibrd);
            r.fbrd.write(fbrd);

            r.lcr_h
                .write((LineControl::FEN | LineControl::WLEN_8BIT).bits());

            r.imsc.write(0);

            r.cr
                .write((Control::UARTEN | Control::TXE | Control::RXE).bits());
        }
    }

    fn flag(&self, bits: Flags) -> bool {
        Flags::from_bits_truncate(self.regs().fr.read()).contains(bits)
    }

    /// Write a single byte, busy-waiting while the TX FIFO is full.
    /// `'\n'` is followed by an implicit `'\r'`.
    pub fn putc(&mut self, c: u8) {
        while self.flag(Flags::TXFF) {
            core::hint::spin_loop();
        }
        // SAFETY: single MMIO device, accessed under the console lock.
        unsafe { self.regs().dr.write(c as u32) };

        if c == b'\n' {
            self.putc(b'\r');
        }
    }

    /// Non-blocking read: `None` if the RX FIFO is empty.
    pub fn getc(&mut self) -> Option<u8> {
        if !self.data_available() {
            return None;
        }
        Some(self.regs().dr.read() as u8)
    }

    /// `true` iff a byte is available to read without blocking.
    pub fn data_available(&self) -> bool {
        !self.flag(Flags::RXFE)
    }
}

impl fmt::Write for Pl011 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.putc(byte);
        }
        Ok(())
    }
}
