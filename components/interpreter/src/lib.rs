//! The bytecode interpreter core
//!
//! A register machine over 16-bit code units: fetch, decode, dispatch,
//! execute, check for suspension, advance. Two dispatch strategies with
//! identical semantics share one handler set: a single `match`
//! ("portable") and a 256-entry handler-function table ("threaded"),
//! whose per-opcode entry points also serve the breakpoint trap's
//! re-dispatch.
//!
//! Failure inside the loop never unwinds in the Rust sense: faulting
//! operations park an exception object on the thread and branch to the
//! shared handler search, which walks exception tables outward frame
//! by frame.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod dispatch;
pub mod exec;
pub mod frame;
pub mod instrumentation;
pub mod machine;

// Re-export main types at crate root
pub use frame::{Frame, FrameStack};
pub use instrumentation::{DebugHooks, InstrumentationTable};
pub use machine::Interpreter;
