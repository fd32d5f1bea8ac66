//! Immutable in-memory code units
//!
//! A `CodeUnit` is one loaded compiled unit: constant pools plus method
//! bodies. Units arrive already parsed and verified (the container
//! parser and verifier are external); the interpreter only ever reads
//! them. All tables are index-addressed and shared via `Arc`.

use std::sync::Arc;

/// A symbolic method reference in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRefItem {
    /// Index into the type-name pool: the declaring type.
    pub owner: u32,
    /// Index into the string pool: the method name.
    pub name: u32,
    /// Index into the proto pool: the shorty signature.
    pub proto: u32,
}

/// A symbolic field reference in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRefItem {
    /// Index into the type-name pool: the declaring type.
    pub owner: u32,
    /// Index into the string pool: the field name.
    pub name: u32,
    /// Index into the type-name pool: the field type.
    pub type_name: u32,
}

/// One guarded range of a method's exception table.
///
/// Ranges may nest; the table is ordered innermost-first and the
/// handler search takes the first covering, type-matching entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryItem {
    /// First covered code-unit offset.
    pub start_pc: u32,
    /// Number of covered code units.
    pub insn_count: u32,
    /// Catch clauses, in declaration order.
    pub handlers: Vec<CatchHandler>,
}

impl TryItem {
    /// Whether the range covers the given pc.
    pub fn covers(&self, pc: u32) -> bool {
        pc >= self.start_pc && pc < self.start_pc + self.insn_count
    }
}

/// One catch clause of a [`TryItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchHandler {
    /// Type-pool index of the caught class, or None for catch-all.
    pub catch_type: Option<u32>,
    /// Code-unit offset of the handler entry point.
    pub handler_pc: u32,
}

/// The body of one interpreted method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    /// Total register window size.
    pub registers_size: u16,
    /// Argument registers (occupy the top of the window).
    pub ins_size: u16,
    /// Maximum outgoing-argument slots of any call site.
    pub outs_size: u16,
    /// The bytecode, 16-bit code units.
    pub insns: Arc<[u16]>,
    /// Exception table, innermost ranges first.
    pub tries: Vec<TryItem>,
}

/// A class definition inside a unit (pre-link form).
#[derive(Debug, Clone)]
pub struct ClassItem {
    /// Type-pool index of this class's name.
    pub name: u32,
    /// Type-pool index of the superclass, if any.
    pub superclass: Option<u32>,
    /// Type-pool indices of implemented interfaces.
    pub interfaces: Vec<u32>,
    /// Access flags (see [`crate::flags`]).
    pub access_flags: u32,
    /// Static fields in declaration order.
    pub static_fields: Vec<FieldItem>,
    /// Instance fields in declaration order.
    pub instance_fields: Vec<FieldItem>,
    /// Methods in declaration order.
    pub methods: Vec<MethodItem>,
}

/// A field declaration inside a unit.
#[derive(Debug, Clone, Copy)]
pub struct FieldItem {
    /// String-pool index of the field name.
    pub name: u32,
    /// Type-pool index of the field type.
    pub type_name: u32,
    /// Access flags.
    pub access_flags: u32,
}

/// A method declaration inside a unit.
#[derive(Debug, Clone)]
pub struct MethodItem {
    /// String-pool index of the method name.
    pub name: u32,
    /// Proto-pool index of the shorty.
    pub proto: u32,
    /// Access flags.
    pub access_flags: u32,
    /// Bytecode, absent for native and abstract methods.
    pub body: Option<Arc<MethodBody>>,
}

/// One loaded, parsed, immutable compiled unit.
///
/// Shared read-only by every thread executing code from it. The lazy
/// resolution rows that shadow these pools live in
/// [`crate::unit_cache::UnitCache`].
#[derive(Debug, Clone)]
pub struct CodeUnit {
    /// String pool.
    pub strings: Vec<Arc<str>>,
    /// Type-name pool; entries index the string pool.
    pub type_names: Vec<u32>,
    /// Proto pool: shorty strings, entries index the string pool.
    pub protos: Vec<u32>,
    /// Method reference pool.
    pub method_refs: Vec<MethodRefItem>,
    /// Field reference pool.
    pub field_refs: Vec<FieldRefItem>,
    /// Classes defined by this unit.
    pub classes: Vec<ClassItem>,
}

impl CodeUnit {
    /// String-pool entry, panicking on a malformed index (units are
    /// validated at build time).
    pub fn string(&self, idx: u32) -> &Arc<str> {
        &self.strings[idx as usize]
    }

    /// Name string of a type-pool entry.
    pub fn type_name(&self, idx: u32) -> &Arc<str> {
        self.string(self.type_names[idx as usize])
    }

    /// Shorty string of a proto-pool entry.
    pub fn shorty(&self, idx: u32) -> &Arc<str> {
        self.string(self.protos[idx as usize])
    }
}
