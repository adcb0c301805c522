//! Compile-time configuration for the QEMU `virt` AArch64 target.
//!
//! Centralizes the constants the memory subsystem and UART driver are built
//! around, the way the teacher centralizes `FRAME_SIZE`/`HEAP_START` across
//! `mm` and `arch::aarch64`.

/// Frame / page granularity. The allocator only ever hands out whole frames.
pub const PAGE_SIZE: usize = 4096;

/// Base of the RAM region QEMU's `virt` machine maps at (`-m` region start).
pub const RAM_BASE: usize = 0x4000_0000;

/// Size of the window the physical frame allocator manages, in bytes.
/// 262_144 frames * 4 KiB = 1 GiB. Memory beyond this window (if QEMU was
/// launched with more RAM) is simply never handed out.
pub const PMM_MANAGEABLE_SIZE: usize = 1024 * 1024 * 1024;

/// Number of frames covered by [`PMM_MANAGEABLE_SIZE`].
pub const PMM_FRAME_COUNT: usize = PMM_MANAGEABLE_SIZE / PAGE_SIZE;

/// PL011 UART MMIO base on the `virt` machine.
pub const UART0_BASE: usize = 0x0900_0000;

/// Console baud rate programmed into the PL011 on init.
pub const UART_BAUD_RATE: u32 = 115_200;

/// UART reference clock QEMU's `virt` machine derives the PL011 from.
pub const UART_CLOCK_HZ: u32 = 48_000_000;

/// Number of bytes the kernel heap grows by per `expand_heap` call, i.e. one
/// physical frame.
pub const HEAP_GROWTH_STEP: usize = PAGE_SIZE;
