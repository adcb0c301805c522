//! Architecture support. AArch64 is the only target this kernel boots on.
//!
//! Gated behind `target_arch` so the host test target — which has neither
//! the AArch64 system registers this module's inline assembly names nor the
//! linker-script symbols its MMIO/boot code expects — can still build and
//! run the architecture-independent unit tests in the rest of the crate.

#[cfg(target_arch = "aarch64")]
pub mod aarch64;
#[cfg(target_arch = "aarch64")]
pub use aarch64::*;
