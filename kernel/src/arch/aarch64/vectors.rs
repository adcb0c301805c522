//! AArch64 exception vector table and synchronous/IRQ/FIQ/SError dispatch.
//!
//! The vector table must be 2048-byte aligned with 16 entries spaced 128
//! bytes apart (the architecture-mandated layout); only `sync_el1h` and
//! `irq_el1h` (current EL, SPx) are reachable in this single-hart, single-EL
//! setup, the rest hang by design since they indicate a model violation.

use core::arch::naked_asm;

use crate::serial;

/// Registers saved across an exception, in the exact order the vector
/// assembly writes them: `x0..x30`, then `SPSR_EL1`, `ELR_EL1`, `SP_EL0`.
/// The field order is load-bearing — the save/restore assembly below
/// indexes into this layout by raw offset.
#[repr(C)]
pub struct TrapFrame {
    pub x: [u64; 31],
    pub spsr_el1: u64,
    pub elr_el1: u64,
    pub sp_el0: u64,
}

const _: () = assert!(core::mem::size_of::<TrapFrame>() == 272);

macro_rules! vector_entry {
    ($handler:ident) => {
        concat!(".align 7\n", "b ", stringify!($handler), "\n",)
    };
}

/// Exception vector table, installed into `VBAR_EL1` by [`install`].
///
/// # Safety
/// Must only be installed once, during early boot, before any exception can
/// be taken.
#[unsafe(naked)]
#[no_mangle]
#[link_section = ".vectors"]
pub unsafe extern "C" fn _vectors() {
    naked_asm!(
        ".align 11",
        // Current EL, SP0 (never entered: we run with SPx from boot)
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
        // Current EL, SPx (the kernel's own exception level)
        vector_entry!(sync_el1h),
        vector_entry!(irq_el1h),
        vector_entry!(fiq_el1h),
        vector_entry!(serror_el1h),
        // Lower EL, AArch64 (unused: no user mode)
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
        // Lower EL, AArch32 (unsupported)
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
        vector_entry!(hang),
    );
}

#[unsafe(naked)]
#[no_mangle]
unsafe extern "C" fn hang() {
    naked_asm!("b .");
}

macro_rules! save_and_dispatch {
    ($handler:ident) => {
        naked_asm!(
            "sub sp, sp, #272",
            "stp x0, x1, [sp, #0]",
            "stp x2, x3, [sp, #16]",
            "stp x4, x5, [sp, #32]",
            "stp x6, x7, [sp, #48]",
            "stp x8, x9, [sp, #64]",
            "stp x10, x11, [sp, #80]",
            "stp x12, x13, [sp, #96]",
            "stp x14, x15, [sp, #112]",
            "stp x16, x17, [sp, #128]",
            "stp x18, x19, [sp, #144]",
            "stp x20, x21, [sp, #160]",
            "stp x22, x23, [sp, #176]",
            "stp x24, x25, [sp, #192]",
            "stp x26, x27, [sp, #208]",
            "stp x28, x29, [sp, #224]",
            "str x30, [sp, #240]",
            "mrs x0, spsr_el1",
            "mrs x1, elr_el1",
            "mrs x2, sp_el0",
            "stp x0, x1, [sp, #248]",
            "str x2, [sp, #264]",
            "mov x0, sp",
            concat!("bl ", stringify!($handler)),
            "ldp x0, x1, [sp, #248]",
            "ldr x2, [sp, #264]",
            "msr spsr_el1, x0",
            "msr elr_el1, x1",
            "msr sp_el0, x2",
            "ldp x0, x1, [sp, #0]",
            "ldp x2, x3, [sp, #16]",
            "ldp x4, x5, [sp, #32]",
            "ldp x6, x7, [sp, #48]",
            "ldp x8, x9, [sp, #64]",
            "ldp x10, x11, [sp, #80]",
            "ldp x12, x13, [sp, #96]",
            "ldp x14, x15, [sp, #112]",
            "ldp x16, x17, [sp, #128]",
            "ldp x18, x19, [sp, #144]",
            "ldp x20, x21, [sp, #160]",
            "ldp x22, x23, [sp, #176]",
            "ldp x24, x25, [sp, #192]",
            "ldp x26, x27, [sp, #208]",
            "ldp x28, x29, [sp, #224]",
            "ldr x30, [sp, #240]",
            "add sp, sp, #272",
            "eret",
        )
    };
}

#[unsafe(naked)]
#[no_mangle]
unsafe extern "C" fn sync_el1h() {
    save_and_dispatch!(sync_exception_handler)
}

#[unsafe(naked)]
#[no_mangle]
unsafe extern "C" fn irq_el1h() {
    save_and_dispatch!(irq_handler)
}

#[unsafe(naked)]
#[no_mangle]
unsafe extern "C" fn fiq_el1h() {
    save_and_dispatch!(fiq_handler)
}

#[unsafe(naked)]
#[no_mangle]
unsafe extern "C" fn serror_el1h() {
    save_and_dispatch!(serror_handler)
}

/// Name an ESR_EL1 exception class for the diagnostic line.
fn ec_name(ec: u64) -> &'static str {
    match ec {
        0x00 => "unknown",
        0x01 => "wfi/wfe trap",
        0x0E => "illegal execution state",
        0x11 => "svc (aarch32)",
        0x15 => "svc (aarch64)",
        0x18 => "msr/mrs trap",
        0x19 => "sve trap",
        0x20 => "instruction abort (lower el)",
        0x21 => "instruction abort (current el)",
        0x22 => "pc alignment fault",
        0x24 => "data abort (lower el)",
        0x25 => "data abort (current el)",
        0x26 => "sp alignment fault",
        0x28 => "fp trap (aarch32)",
        0x2C => "fp trap (aarch64)",
        0x2F => "serror",
        0x30 => "breakpoint (lower el)",
        0x31 => "breakpoint (current el)",
        0x32 => "software step (lower el)",
        0x33 => "software step (current el)",
        0x34 => "watchpoint (lower el)",
        0x35 => "watchpoint (current el)",
        0x3C => "brk",
        _ => "reserved",
    }
}

fn read_esr_el1() -> u64 {
    let esr: u64;
    // SAFETY: reads a system register, no side effects.
    unsafe { core::arch::asm!("mrs {}, esr_el1", out(reg) esr, options(nomem, nostack)) };
    esr
}

fn read_far_el1() -> u64 {
    let far: u64;
    // SAFETY: reads a system register, no side effects.
    unsafe { core::arch::asm!("mrs {}, far_el1", out(reg) far, options(nomem, nostack)) };
    far
}

const EC_DATA_ABORT_LOWER: u64 = 0x24;
const EC_DATA_ABORT_CURRENT: u64 = 0x25;
const EC_INSN_ABORT_LOWER: u64 = 0x20;
const EC_INSN_ABORT_CURRENT: u64 = 0x21;
const EC_BRK64: u64 = 0x3C;
const EC_SVC64: u64 = 0x15;

/// Synchronous exception dispatcher.
///
/// Decodes `ESR_EL1` into `EC`/`ISS`, logs a named diagnostic, then either
/// resumes past the faulting instruction (`BRK64`, `SVC64`) or panics.
#[no_mangle]
extern "C" fn sync_exception_handler(frame: &mut TrapFrame) {
    let esr = read_esr_el1();
    let ec = (esr >> 26) & 0x3F;
    let iss = esr & 0x01FF_FFFF;

    log::warn!("exception: {} (EC=0x{:02x} ISS=0x{:06x})", ec_name(ec), ec, iss);

    match ec {
        EC_INSN_ABORT_LOWER | EC_INSN_ABORT_CURRENT | EC_DATA_ABORT_LOWER | EC_DATA_ABORT_CURRENT => {
            log::error!("far_el1 = 0x{:016x}", read_far_el1());
            panic!("unhandled synchronous exception: {}", ec_name(ec));
        }
        EC_BRK64 => {
            frame.elr_el1 += 4;
        }
        EC_SVC64 => {
            let imm16 = iss & 0xFFFF;
            log::info!("svc #{}", imm16);
            frame.elr_el1 += 4;
        }
        _ => {
            panic!("unhandled synchronous exception: {}", ec_name(ec));
        }
    }
}

/// IRQ dispatcher. No GIC is wired in the core; every IRQ is logged and
/// returned from.
#[no_mangle]
extern "C" fn irq_handler(_frame: &mut TrapFrame) {
    log::warn!("unexpected irq (no interrupt controller wired)");
}

#[no_mangle]
extern "C" fn fiq_handler(_frame: &mut TrapFrame) -> ! {
    panic!("fiq taken with no fiq source configured");
}

#[no_mangle]
extern "C" fn serror_handler(_frame: &mut TrapFrame) -> ! {
    panic!("serror taken");
}

/// Install the vector table and point `VBAR_EL1` at it.
///
/// # Safety
/// Must be called once, early in boot, before interrupts are unmasked.
pub unsafe fn install() {
    // SAFETY: `_vectors` is a 2048-byte aligned, 16-entry table emitted by
    // this module; writing its address to VBAR_EL1 is the documented way to
    // install an AArch64 exception vector table.
    unsafe {
        core::arch::asm!(
            "adr {tmp}, _vectors",
            "msr vbar_el1, {tmp}",
            "isb",
            tmp = out(reg) _,
            options(nomem, nostack)
        );
    }
}

/// Kernel-wide panic entry point: masks DAIF, prints the message, halts.
pub fn panic_halt(info: &core::panic::PanicInfo) -> ! {
    // SAFETY: masks all four DAIF bits so no further exception preempts the
    // panic message; this hart never returns from the following loop.
    unsafe { core::arch::asm!("msr daifset, #0xf", options(nomem, nostack)) };
    serial::_print(format_args!("\n[panic] {}\n", info));
    loop {
        // SAFETY: `wfi` is always safe; interrupts are masked so it parks
        // the core until the next reset.
        unsafe { core::arch::asm!("wfi", options(nomem, nostack)) };
    }
}
