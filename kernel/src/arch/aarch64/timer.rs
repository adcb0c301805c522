//! Free-running timestamp source for the log service.
//!
//! No periodic timer interrupt is configured here — the core has no GIC
//! wired (see the exception dispatcher's `irq_handler`) — so this just reads
//! the always-running AArch64 generic timer counter directly. Values are
//! relative to CPU reset, never wall-clock time.

fn read_cntpct_el0() -> u64 {
    let v: u64;
    // SAFETY: reads a read-only system register, no side effects.
    unsafe { core::arch::asm!("mrs {}, cntpct_el0", out(reg) v, options(nomem, nostack)) };
    v
}

fn read_cntfrq_el0() -> u64 {
    let v: u64;
    // SAFETY: reads a read-only system register, no side effects.
    unsafe { core::arch::asm!("mrs {}, cntfrq_el0", out(reg) v, options(nomem, nostack)) };
    v
}

/// Milliseconds elapsed on the generic timer since an arbitrary epoch (the
/// last CPU reset). Used only to order log entries relative to each other,
/// never as a wall-clock source.
pub fn get_timestamp_ms() -> u64 {
    let freq = read_cntfrq_el0();
    if freq == 0 {
        return 0;
    }
    read_cntpct_el0() / (freq / 1000).max(1)
}
