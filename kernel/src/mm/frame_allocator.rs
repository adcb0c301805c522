//! Bitmap-backed physical frame allocator.
//!
//! One bit per 4 KiB frame across a fixed 1 GiB manageable window starting
//! at `RAM_BASE`. The bitmap *is* the free list (I1): there is no separate
//! structure to keep in sync with it.

use spin::Mutex;

#[cfg(target_arch = "aarch64")]
use crate::arch::aarch64::linker;
use crate::config::{PAGE_SIZE, PMM_FRAME_COUNT, PMM_MANAGEABLE_SIZE, RAM_BASE};
use crate::error::{KernelError, KernelResult};

const BITMAP_BYTES: usize = PMM_FRAME_COUNT / 8;

/// Base address of a physical frame or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysicalAddress(pub usize);

impl PhysicalAddress {
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// A span of physical memory as described by a boot-time memory map, or
/// synthesized from the linker-exported kernel image bounds when no map is
/// supplied.
#[derive(Debug, Clone, Copy)]
pub struct MemoryRegion {
    pub start: PhysicalAddress,
    pub size: usize,
    pub usable: bool,
}

/// Boot parameters consumed by [`frame_alloc_init`].
///
/// `uefi_memory_map` carries an optional UEFI-style descriptor array; this
/// core does not walk it (see the reduced initialization procedure below)
/// but preserves the field so callers that do have a map can still pass it
/// through without reshaping their boot code.
#[derive(Debug, Clone, Copy)]
pub struct BootParams {
    pub uefi_memory_map: Option<*const MemoryRegion>,
    pub map_size: usize,
    pub map_desc_size: usize,
    pub map_desc_version: u32,
    pub kernel_phys_start: PhysicalAddress,
    pub kernel_phys_end: PhysicalAddress,
}

impl BootParams {
    /// Boot parameters derived from the linker-exported kernel image
    /// symbols, for the case where no UEFI-style memory map is available.
    #[cfg(target_arch = "aarch64")]
    pub fn from_linker_symbols() -> Self {
        Self {
            uefi_memory_map: None,
            map_size: 0,
            map_desc_size: 0,
            map_desc_version: 0,
            kernel_phys_start: PhysicalAddress(linker::kernel_start()),
            kernel_phys_end: PhysicalAddress(linker::kernel_end()),
        }
    }
}

/// Counter snapshot for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAllocatorStats {
    pub total_memory: usize,
    pub free_memory: usize,
    pub highest_usable_address: usize,
}

struct FrameAllocator {
    bitmap: [u8; BITMAP_BYTES],
    total_memory: usize,
    free_memory: usize,
    highest_usable_address: usize,
    initialized: bool,
}

impl FrameAllocator {
    const fn new() -> Self {
        Self {
            bitmap: [0xFF; BITMAP_BYTES],
            total_memory: 0,
            free_memory: 0,
            highest_usable_address: RAM_BASE,
            initialized: false,
        }
    }

    fn frame_index(&self, addr: usize) -> Option<usize> {
        if addr < RAM_BASE || addr >= RAM_BASE + PMM_MANAGEABLE_SIZE {
            return None;
        }
        Some((addr - RAM_BASE) / PAGE_SIZE)
    }

    fn test_bit(&self, i: usize) -> bool {
        self.bitmap[i / 8] & (1 << (i % 8)) != 0
    }

    fn set_bit(&mut self, i: usize) {
        self.bitmap[i / 8] |= 1 << (i % 8);
    }

    fn clear_bit(&mut self, i: usize) {
        self.bitmap[i / 8] &= !(1 << (i % 8));
    }

    /// Clip `[base, base+size)` to the manageable window, rounding outward
    /// to whole frames. Returns `None` if the clipped range is empty.
    fn clip_to_frames(&self, base: usize, size: usize) -> Option<(usize, usize)> {
        let start = base.max(RAM_BASE);
        let end = (base.saturating_add(size)).min(RAM_BASE + PMM_MANAGEABLE_SIZE);
        if start >= end {
            return None;
        }
        let first = (start - RAM_BASE) / PAGE_SIZE;
        let last = (end - RAM_BASE - 1) / PAGE_SIZE;
        Some((first, last))
    }

    /// Mark every frame touching `[base, base+size)` used. Idempotent:
    /// counters move only on a genuine free -> used transition.
    fn mark_range_used(&mut self, base: usize, size: usize) {
        let Some((first, last)) = self.clip_to_frames(base, size) else {
            return;
        };
        for i in first..=last {
            if !self.test_bit(i) {
                self.set_bit(i);
                self.free_memory -= PAGE_SIZE;
            }
        }
    }

    /// Mark every frame touching `[base, base+size)` free. Idempotent:
    /// counters move only on a genuine used -> free transition.
    ///
    /// `total_memory` and `highest_usable_address` are high-water marks,
    /// like I3 requires of the latter: they only grow, recording the
    /// manageable capacity this allocator has ever unmasked. They are not
    /// expected to shrink back down through `mark_range_used`.
    fn mark_range_free(&mut self, base: usize, size: usize) {
        let Some((first, last)) = self.clip_to_frames(base, size) else {
            return;
        };
        for i in first..=last {
            if self.test_bit(i) {
                self.clear_bit(i);
                self.total_memory += PAGE_SIZE;
                self.free_memory += PAGE_SIZE;
                let frame_end = RAM_BASE + (i + 1) * PAGE_SIZE;
                if frame_end > self.highest_usable_address {
                    self.highest_usable_address = frame_end;
                }
            }
        }
    }

    /// Claim the first free frame's bit and return its base address,
    /// without touching its contents. Zeroing (P3) happens in the public
    /// wrapper, which is the only caller that knows whether `addr` is
    /// backed by real memory (bare metal) or just a bitmap-tracked address
    /// (host unit tests).
    fn claim_frame(&mut self) -> Option<usize> {
        for i in 0..PMM_FRAME_COUNT {
            if !self.test_bit(i) {
                self.set_bit(i);
                self.free_memory -= PAGE_SIZE;
                return Some(RAM_BASE + i * PAGE_SIZE);
            }
        }
        log::warn!("alloc_frame: out of frames ({} free)", self.free_memory / PAGE_SIZE);
        None
    }

    /// Claim a frame and zero it (P3). The claimed address is only backed by
    /// real memory on actual hardware; under the host test harness it is
    /// just a bitmap-tracked number, so the zero-fill is skipped there (see
    /// `alloc_frame_zeroes_payload_p3` below, which only runs bare-metal).
    fn alloc_frame(&mut self) -> Option<usize> {
        let addr = self.claim_frame()?;
        #[cfg(target_os = "none")]
        {
            // SAFETY: `addr` was just claimed from the bitmap and is a
            // page-aligned frame within the manageable window, unused by
            // anyone else.
            unsafe { core::ptr::write_bytes(addr as *mut u8, 0, PAGE_SIZE) };
        }
        Some(addr)
    }

    fn free_frame(&mut self, addr: usize) {
        if addr == 0 {
            return;
        }
        if addr % PAGE_SIZE != 0 {
            log::warn!("free_frame: misaligned address {:#x}", addr);
            return;
        }
        let Some(i) = self.frame_index(addr) else {
            log::warn!("free_frame: {:#x} outside the manageable window", addr);
            return;
        };
        if !self.test_bit(i) {
            log::warn!("free_frame: double free at {:#x}", addr);
            return;
        }
        self.clear_bit(i);
        self.free_memory += PAGE_SIZE;
    }
}

// SAFETY: the single-hart model means this Mutex exists for re-entrancy
// safety, not real contention; no interrupt-driven caller may reach the
// allocator without first masking DAIF (see the concurrency notes on the
// dispatcher).
static FRAME_ALLOCATOR: Mutex<FrameAllocator> = Mutex::new(FrameAllocator::new());

/// Run the physical frame allocator's one-time initialization.
///
/// Zeros the counters, marks the whole manageable window free, then marks
/// the kernel image and the bitmap's own reserved region used again.
pub fn frame_alloc_init(params: &BootParams) -> KernelResult<()> {
    let mut allocator = FRAME_ALLOCATOR.lock();
    if allocator.initialized {
        return Err(KernelError::AlreadyInitialized {
            subsystem: "frame_allocator",
        });
    }

    allocator.bitmap = [0xFF; BITMAP_BYTES];
    allocator.total_memory = 0;
    allocator.free_memory = 0;
    allocator.highest_usable_address = RAM_BASE;

    allocator.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);

    let kernel_start = params.kernel_phys_start.as_usize();
    let kernel_end = params.kernel_phys_end.as_usize();
    allocator.mark_range_used(kernel_start, kernel_end.saturating_sub(kernel_start));

    // Host test builds have no linker script, and therefore no bitmap
    // storage region to reserve; real boots always run on aarch64, where
    // `link.ld` guarantees `_pmm_bitmap_{start,end}` bracket the statically
    // sized `FRAME_ALLOCATOR.bitmap` array.
    #[cfg(target_arch = "aarch64")]
    {
        let bitmap_start = linker::pmm_bitmap_start();
        let bitmap_end = linker::pmm_bitmap_end();
        allocator.mark_range_used(bitmap_start, bitmap_end.saturating_sub(bitmap_start));
    }

    allocator.initialized = true;

    log::info!(
        "pmm: {} KiB total, {} KiB free",
        allocator.total_memory / 1024,
        allocator.free_memory / 1024
    );

    Ok(())
}

/// Allocate one zero-filled, page-aligned frame. Returns `None` if no
/// frame is free.
pub fn alloc_frame() -> Option<usize> {
    FRAME_ALLOCATOR.lock().alloc_frame()
}

/// Release a previously allocated frame. Silently ignores a null address;
/// logs and ignores a misaligned, out-of-range, or already-free address.
pub fn free_frame(addr: usize) {
    FRAME_ALLOCATOR.lock().free_frame(addr);
}

/// Mark every frame touching `[base, base+size)` used.
pub fn mark_range_used(base: usize, size: usize) {
    FRAME_ALLOCATOR.lock().mark_range_used(base, size);
}

/// Mark every frame touching `[base, base+size)` free.
pub fn mark_range_free(base: usize, size: usize) {
    FRAME_ALLOCATOR.lock().mark_range_free(base, size);
}

pub fn total_memory() -> usize {
    FRAME_ALLOCATOR.lock().total_memory
}

pub fn free_memory() -> usize {
    FRAME_ALLOCATOR.lock().free_memory
}

pub fn highest_usable_address() -> usize {
    FRAME_ALLOCATOR.lock().highest_usable_address
}

pub fn stats() -> FrameAllocatorStats {
    let a = FRAME_ALLOCATOR.lock();
    FrameAllocatorStats {
        total_memory: a.total_memory,
        free_memory: a.free_memory,
        highest_usable_address: a.highest_usable_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh, un-Mutex'd allocator for host-side unit tests, so each test
    /// gets independent state instead of sharing the crate-wide static.
    fn fresh() -> FrameAllocator {
        FrameAllocator::new()
    }

    #[test]
    fn bitmap_sizing_matches_manageable_window() {
        assert_eq!(PMM_FRAME_COUNT, 262_144);
        assert_eq!(BITMAP_BYTES, 32_768);
    }

    #[test]
    fn init_unmasks_whole_window_then_reserves_kernel_and_bitmap() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        assert_eq!(a.total_memory, PMM_MANAGEABLE_SIZE);
        assert_eq!(a.free_memory, PMM_MANAGEABLE_SIZE);

        let kernel_start = 0x4008_0000usize;
        let kernel_end = 0x4010_0000usize;
        a.mark_range_used(kernel_start, kernel_end - kernel_start);

        assert_eq!(a.free_memory, PMM_MANAGEABLE_SIZE - (kernel_end - kernel_start));
    }

    #[test]
    fn alloc_then_free_restores_free_memory_p1() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let before = a.free_memory;

        let p1 = a.alloc_frame().expect("frame available");
        assert_eq!(p1, RAM_BASE);
        assert_eq!(p1 & 0xFFF, 0);
        assert_eq!(a.free_memory, before - PAGE_SIZE);

        a.free_frame(p1);
        assert_eq!(a.free_memory, before);
        assert!(!a.test_bit(0));
    }

    // P3 (zero-filled payload) is only exercised bare-metal: on the host
    // test target `alloc_frame` returns a bitmap-tracked number with no
    // backing memory, so dereferencing it here would be undefined behavior.
    // See `tests/memory_tests.rs` for the real zero-fill check.
    #[cfg(target_os = "none")]
    #[test]
    fn alloc_frame_zeroes_payload_p3() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let p = a.alloc_frame().expect("frame available");
        // SAFETY: bare-metal only; `p` is a real, identity-mapped frame.
        let bytes = unsafe { core::slice::from_raw_parts(p as *const u8, PAGE_SIZE) };
        assert!(bytes.iter().all(|&b| b == 0));
        a.free_frame(p);
    }

    #[test]
    fn allocations_are_distinct_p2() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let p1 = a.alloc_frame().unwrap();
        let p2 = a.alloc_frame().unwrap();
        assert_ne!(p1, p2);
        assert!(p1 >= RAM_BASE && p1 < RAM_BASE + PMM_MANAGEABLE_SIZE);
        assert!(p2 >= RAM_BASE && p2 < RAM_BASE + PMM_MANAGEABLE_SIZE);
    }

    #[test]
    fn highest_usable_address_is_monotone_p7() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PAGE_SIZE);
        let first = a.highest_usable_address;
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        assert!(a.highest_usable_address >= first);
        a.mark_range_used(RAM_BASE, PAGE_SIZE);
        assert!(a.highest_usable_address >= first);
    }

    #[test]
    fn free_memory_round_trips_r1() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let before = a.free_memory;

        a.mark_range_used(RAM_BASE, PAGE_SIZE * 4);
        a.mark_range_free(RAM_BASE, PAGE_SIZE * 4);

        assert_eq!(a.free_memory, before);
    }

    #[test]
    fn free_frame_is_net_zero_r2() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let before = a.free_memory;
        let p = a.alloc_frame().unwrap();
        a.free_frame(p);
        assert_eq!(a.free_memory, before);
    }

    #[test]
    fn free_frame_rejects_null_misaligned_double_free() {
        let mut a = fresh();
        a.mark_range_free(RAM_BASE, PMM_MANAGEABLE_SIZE);
        let before = a.free_memory;

        a.free_frame(0);
        assert_eq!(a.free_memory, before);

        a.free_frame(RAM_BASE + 1);
        assert_eq!(a.free_memory, before);

        let p = a.alloc_frame().unwrap();
        a.free_frame(p);
        let after_one_free = a.free_memory;
        a.free_frame(p);
        assert_eq!(a.free_memory, after_one_free);
    }
}
