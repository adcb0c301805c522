//! Kernel error types.
//!
//! Used at subsystem-boundary calls (`frame_alloc_init`, `kheap_init`,
//! driver `init`) where a `Result`-shaped contract makes sense. Hot
//! allocation paths (`alloc_frame`, `kmalloc`) prefer an absent value plus a
//! logged diagnostic instead, matching the no-panic policy the allocators
//! document on their public functions.

use core::fmt;

/// Kernel-wide error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "kernel errors must be handled, not silently discarded"]
pub enum KernelError {
    /// A request could not be satisfied by the frame or heap allocator.
    OutOfMemory { requested: usize, available: usize },
    /// An address fell outside a region the caller expected it to be in.
    InvalidAddress { addr: usize },
    /// A subsystem function was called before its `init()`.
    NotInitialized { subsystem: &'static str },
    /// `init()` was called a second time on an already-initialized subsystem.
    AlreadyInitialized { subsystem: &'static str },
    /// A caller-supplied argument violated a precondition.
    InvalidArgument { name: &'static str, value: &'static str },
    /// The operation is not supported in this configuration.
    OperationNotSupported { operation: &'static str },
}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested, available } => write!(
                f,
                "out of memory: requested {} bytes, {} available",
                requested, available
            ),
            Self::InvalidAddress { addr } => write!(f, "invalid address: 0x{:x}", addr),
            Self::NotInitialized { subsystem } => {
                write!(f, "subsystem not initialized: {}", subsystem)
            }
            Self::AlreadyInitialized { subsystem } => {
                write!(f, "subsystem already initialized: {}", subsystem)
            }
            Self::InvalidArgument { name, value } => {
                write!(f, "invalid argument '{}': {}", name, value)
            }
            Self::OperationNotSupported { operation } => {
                write!(f, "operation not supported: {}", operation)
            }
        }
    }
}

/// Helper macro for constructing a [`KernelError`] variant tersely at call
/// sites, mirroring the positional-field style used elsewhere in the crate.
#[macro_export]
macro_rules! kernel_error {
    (OutOfMemory { requested: $req:expr, available: $avail:expr }) => {
        $crate::error::KernelError::OutOfMemory {
            requested: $req,
            available: $avail,
        }
    };
    (InvalidArgument { $name:expr => $value:expr }) => {
        $crate::error::KernelError::InvalidArgument {
            name: $name,
            value: $value,
        }
    };
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::KernelError::$variant { $($field: $value),* }
    };
}
