//! Accessors for the linker-exported symbols declared in `link.ld`.
//!
//! Each symbol is an opaque marker whose *address* (never its contents) is
//! the value of interest, so every accessor takes `&symbol as *const u8 as
//! usize` rather than dereferencing.

extern "C" {
    static _kernel_start: u8;
    static _text_end: u8;
    static _rodata_start: u8;
    static _rodata_end: u8;
    static _rodata_load: u8;
    static _data_start: u8;
    static _data_end: u8;
    static _data_load: u8;
    static _bss_start: u8;
    static _bss_end: u8;
    static _stack_top: u8;
    static _stack_bottom: u8;
    static _pmm_bitmap_start: u8;
    static _pmm_bitmap_end: u8;
    static _kernel_end: u8;
}

macro_rules! symbol_addr {
    ($(#[$meta:meta])* $name:ident, $sym:ident) => {
        $(#[$meta])*
        pub fn $name() -> usize {
            // SAFETY: taking the address of a linker-defined marker symbol;
            // the symbol is never read through.
            unsafe { &$sym as *const u8 as usize }
        }
    };
}

symbol_addr!(kernel_start, _kernel_start);
symbol_addr!(text_end, _text_end);
symbol_addr!(rodata_start, _rodata_start);
symbol_addr!(rodata_end, _rodata_end);
symbol_addr!(rodata_load, _rodata_load);
symbol_addr!(data_start, _data_start);
symbol_addr!(data_end, _data_end);
symbol_addr!(data_load, _data_load);
symbol_addr!(bss_start, _bss_start);
symbol_addr!(bss_end, _bss_end);
symbol_addr!(stack_top, _stack_top);
symbol_addr!(stack_bottom, _stack_bottom);
symbol_addr!(pmm_bitmap_start, _pmm_bitmap_start);
symbol_addr!(pmm_bitmap_end, _pmm_bitmap_end);
symbol_addr!(kernel_end, _kernel_end);
