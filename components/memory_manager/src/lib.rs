//! Heap facade and reference bookkeeping for the Forge VM
//!
//! The tracing collector itself is an external collaborator; this crate
//! provides what the interpreter consumes from it:
//! - A handle-based object heap (`allocate` primitives, budget enforced)
//! - Reentrant per-object monitors
//! - `ReferenceTable`: pinning objects reachable from native contexts
//! - `PointerSet`: sorted, deduplicated identity set
//! - Allocation tracking for the window between allocation and first
//!   reachable store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod heap;
pub mod monitor;
pub mod pointer_set;
pub mod ref_table;
pub mod track;

// Re-export main types at crate root
pub use heap::{ArrayData, Heap, HeapObject, ObjectBody};
pub use monitor::Monitor;
pub use pointer_set::PointerSet;
pub use ref_table::ReferenceTable;
pub use track::TrackedAllocs;
