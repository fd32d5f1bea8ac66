//! Runtime context and thread model for the Forge VM
//!
//! Process-wide state is never ambient: everything lives in one
//! `RuntimeContext` constructed at startup and passed into every
//! component. This crate also owns the thread model: the global
//! mutator lock, per-thread suspend counts, and the safepoint
//! suspension protocol the interpreter and debugger cooperate through.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod context;
pub mod exception;
pub mod mutator;
pub mod thread;

// Re-export main types at crate root
pub use context::{Invoker, LoadedUnit, NativeFn, RuntimeContext, WellKnown};
pub use mutator::MutatorLock;
pub use thread::{
    FrameView, ThreadControl, ThreadRegistry, ThreadSnapshot, ThreadStatus, VmThread,
};
