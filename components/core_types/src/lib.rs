//! Core value and identifier types for the Forge VM
//!
//! This crate provides the leaf-level vocabulary shared by every runtime
//! component:
//! - Untyped runtime identifiers (classes, methods, fields, objects, threads)
//! - `JValue`, the typed value that crosses call boundaries
//! - Primitive type descriptors and shorty-character mapping
//! - The shared error taxonomy and the pending-exception marker
//! - Runtime options

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ids;
pub mod options;
pub mod primitive;
pub mod value;

// Re-export main types at crate root
pub use error::{ExceptionRaised, ExecResult, VmError};
pub use ids::{ClassId, FieldId, MethodId, ObjRef, ThreadId, UnitId};
pub use options::{DispatchKind, JdwpTransportKind, RuntimeOptions};
pub use primitive::PrimitiveType;
pub use value::JValue;
