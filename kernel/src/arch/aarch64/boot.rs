//! Rust-side boot trampoline.
//!
//! The reset vector, stack setup, and jump into `_start_rust` are assembly
//! that lives outside this crate's scope; this file picks up from the first
//! instruction that can safely run Rust — BSS is the only state it must
//! establish itself before calling [`crate::kernel_main`].

#[no_mangle]
#[link_section = ".text.boot"]
pub extern "C" fn _start_rust() -> ! {
    extern "C" {
        static mut _bss_start: u8;
        static mut _bss_end: u8;
    }

    // SAFETY: runs once, single-threaded, before any other code reads or
    // writes the .bss region; `_bss_start`/`_bss_end` come from the linker
    // script and bound exactly that region.
    unsafe {
        let bss_start = &raw mut _bss_start;
        let bss_end = &raw const _bss_end;
        let bss_size = bss_end as usize - bss_start as usize;
        core::ptr::write_bytes(bss_start, 0, bss_size);

        crate::kernel_main()
    }
}
