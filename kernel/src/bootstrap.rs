//! Kernel boot sequence.
//!
//! Runs once, from [`crate::arch::aarch64::boot::_start_rust`] after `.bss`
//! is zeroed. No subsystem here may be re-initialized: each `init` call
//! below fails loudly (via [`KernelError::AlreadyInitialized`] or an
//! equivalent) if invoked twice, which can only happen from a bug in this
//! function itself.

use crate::error::KernelResult;
use crate::mm::BootParams;
use crate::{arch, log_service, mm, serial};

/// Bring the kernel up: console, exception vectors, physical memory, the
/// heap, then hand off to the (currently absent) interactive consumer.
///
/// UART initialization is implicit — the first `println!` call below
/// writes through it, and [`serial::init`] has already run by the time
/// anything can observe output. On return from the consumer loop (today,
/// immediately — there is no shell yet), the core parks in [`arch::halt`].
pub fn kernel_init() -> ! {
    serial::init();
    log_service::log_init();

    println!("aranea kernel v{}", env!("CARGO_PKG_VERSION"));
    println!("build {} ({})", env!("GIT_HASH"), env!("BUILD_TIMESTAMP"));

    arch::init();

    if let Err(e) = bring_up_memory() {
        panic!("memory subsystem init failed: {}", e);
    }

    println!("kernel initialized, entering idle loop");

    // No interactive consumer (shell/TUI) is wired up yet; this is where
    // one would be entered. Falling straight through to halt keeps the
    // contract ("on loop return, enters a wfi halt") satisfiable today.
    arch::halt();
}

fn bring_up_memory() -> KernelResult<()> {
    let params = BootParams::from_linker_symbols();
    mm::init(&params)?;

    let pmm = mm::frame_allocator::stats();
    log::info!(
        "pmm ready: {} KiB total, {} KiB free",
        pmm.total_memory / 1024,
        pmm.free_memory / 1024
    );

    let heap = mm::heap::stats();
    log::info!(
        "heap ready: {} blocks, {} free",
        heap.block_count,
        heap.free_block_count
    );

    Ok(())
}
