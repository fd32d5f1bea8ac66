//! Shared error taxonomy
//!
//! Host-level failures (bad unit data, double init, exhausted limits)
//! are ordinary Rust errors. Exceptions raised by interpreted code are
//! *not*: they live in the owning thread's pending-exception slot, and
//! fallible paths signal them with the zero-information [`ExceptionRaised`]
//! marker so the dispatch loop can branch to its unified exception path.

use thiserror::Error;

/// Host-level VM errors (never visible to interpreted code).
#[derive(Debug, Error)]
pub enum VmError {
    /// The runtime context was initialized twice.
    #[error("runtime already initialized")]
    AlreadyInitialized,

    /// A code unit failed structural validation at load time.
    #[error("invalid code unit: {0}")]
    InvalidUnit(String),

    /// The configured heap budget was exhausted.
    #[error("heap limit exceeded (requested {requested} bytes, limit {limit})")]
    HeapExhausted {
        /// Bytes requested by the failing allocation.
        requested: usize,
        /// Configured heap limit.
        limit: usize,
    },

    /// An option value could not be parsed.
    #[error("bad runtime option: {0}")]
    BadOption(String),
}

/// Marker for a pending interpreted-code exception.
///
/// The exception object itself is in the raising thread's pending slot;
/// this type carries no payload on purpose so intermediate frames cannot
/// accidentally consume or reorder it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionRaised;

/// Result type for operations that may raise an interpreted exception.
pub type ExecResult<T> = Result<T, ExceptionRaised>;
