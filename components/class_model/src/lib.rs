//! Class container model for the Forge VM
//!
//! This crate defines the in-memory form of one compiled unit and the
//! runtime-linked class metadata built from it:
//! - `CodeUnit`: immutable constant pools plus method bodies
//! - `UnitBuilder`: programmatic construction (the binary container
//!   parser is an external collaborator; the VM never parses raw bytes)
//! - The instruction set: opcode numbering, widths, names
//! - `ClassDef`/`MethodDef`/`FieldDef`: linked runtime metadata
//! - `UnitCache`: the per-unit lazy resolution table rows

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod class;
pub mod flags;
pub mod opcodes;
pub mod unit;
pub mod unit_cache;

// Re-export main types at crate root
pub use builder::{ClassBuilder, MethodBuilder, UnitBuilder};
pub use class::{ClassDef, ClassStatus, FieldDef, InitAction, InitState, MethodDef};
pub use unit::{
    CatchHandler, ClassItem, CodeUnit, FieldItem, FieldRefItem, MethodBody, MethodItem,
    MethodRefItem, TryItem,
};
pub use unit_cache::UnitCache;
