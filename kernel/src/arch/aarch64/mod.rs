//! AArch64 architecture support: boot trampoline, exception vectors, UART.

pub mod boot;
pub mod linker;
pub mod pl011;
pub mod timer;
pub mod vectors;

/// Install the exception vector table. Must run before anything that could
/// fault or take an interrupt.
pub fn init() {
    // SAFETY: called once from the boot trampoline, before interrupts are
    // unmasked and before any exception can be taken.
    unsafe { vectors::install() };
}

/// Park this core until the next exception or interrupt.
pub fn halt() -> ! {
    loop {
        cortex_a::asm::wfe();
    }
}

/// Yield the core for one wait-for-event cycle.
pub fn idle() {
    cortex_a::asm::wfe();
}
