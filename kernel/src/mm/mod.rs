//! Memory management: physical frame allocation and the kernel heap.

pub mod frame_allocator;
pub mod heap;

pub use frame_allocator::{BootParams, FrameAllocatorStats, MemoryRegion, PhysicalAddress};
pub use heap::{HeapStats, KernelHeapAllocator};

use crate::error::KernelResult;

/// Bring up memory management: the physical frame allocator, then the
/// kernel heap grown from it. Must run exactly once, after UART output is
/// available (both subsystems log through it) and before anything that
/// allocates.
pub fn init(params: &BootParams) -> KernelResult<()> {
    frame_allocator::frame_alloc_init(params)?;
    heap::kheap_init()?;
    Ok(())
}
