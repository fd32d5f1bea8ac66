//! Lazy symbol resolution for the Forge VM
//!
//! The interpreter executes against symbolic pool indices; this crate
//! turns them into runtime entities on first use per call site:
//! - `linker`: builds `ClassDef`/`MethodDef`/`FieldDef` from a loaded
//!   unit (field offsets, vtables, static storage)
//! - `resolve`: the cache protocol: lock-free hit path, idempotent
//!   last-writer-wins fill on miss, pending exception on failure
//! - `initialize`: the reentrant class-initialization state machine
//!   driver, which may run `<clinit>` through the installed invoker
//! - `arrays`: on-demand array classes and element-type parsing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arrays;
pub mod initialize;
pub mod linker;
pub mod resolve;

pub use arrays::{array_class_for, element_type};
pub use initialize::ensure_initialized;
pub use linker::link_unit;
pub use resolve::{
    class_object, resolve_class, resolve_field, resolve_method, resolve_string,
};
