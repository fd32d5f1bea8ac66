//! Per-unit lazy resolution rows
//!
//! One atomic slot per constant-pool index, shared by every thread
//! executing code from the unit. Slots are monotonic: 0 means
//! unresolved, any other value is the resolved entity and is never
//! cleared. Concurrent resolvers race benignly: resolution is
//! idempotent, so the last writer stores the same value the first one
//! did, and the read path takes no lock.

use std::sync::atomic::{AtomicU32, Ordering};

use core_types::{ClassId, FieldId, MethodId, ObjRef};

use crate::unit::CodeUnit;

fn slots(n: usize) -> Box<[AtomicU32]> {
    (0..n).map(|_| AtomicU32::new(0)).collect()
}

/// Resolution cache rows for one code unit.
#[derive(Debug)]
pub struct UnitCache {
    strings: Box<[AtomicU32]>,
    classes: Box<[AtomicU32]>,
    methods: Box<[AtomicU32]>,
    fields: Box<[AtomicU32]>,
}

impl UnitCache {
    /// Empty cache sized for the unit's pools.
    pub fn for_unit(unit: &CodeUnit) -> Self {
        Self {
            strings: slots(unit.strings.len()),
            classes: slots(unit.type_names.len()),
            methods: slots(unit.method_refs.len()),
            fields: slots(unit.field_refs.len()),
        }
    }

    /// Resolved interned-string handle for a string-pool index.
    pub fn resolved_string(&self, idx: u32) -> Option<ObjRef> {
        match self.strings[idx as usize].load(Ordering::Acquire) {
            0 => None,
            raw => Some(ObjRef::from_raw(raw)),
        }
    }

    /// Record a resolved interned string (idempotent).
    pub fn put_string(&self, idx: u32, handle: ObjRef) {
        debug_assert!(!handle.is_null());
        self.strings[idx as usize].store(handle.raw(), Ordering::Release);
    }

    /// Resolved class for a type-pool index.
    pub fn resolved_class(&self, idx: u32) -> Option<ClassId> {
        match self.classes[idx as usize].load(Ordering::Acquire) {
            0 => None,
            v => Some(ClassId(v - 1)),
        }
    }

    /// Record a resolved class (idempotent).
    pub fn put_class(&self, idx: u32, id: ClassId) {
        self.classes[idx as usize].store(id.0 + 1, Ordering::Release);
    }

    /// Resolved method for a method-ref index.
    pub fn resolved_method(&self, idx: u32) -> Option<MethodId> {
        match self.methods[idx as usize].load(Ordering::Acquire) {
            0 => None,
            v => Some(MethodId(v - 1)),
        }
    }

    /// Record a resolved method (idempotent).
    pub fn put_method(&self, idx: u32, id: MethodId) {
        self.methods[idx as usize].store(id.0 + 1, Ordering::Release);
    }

    /// Resolved field for a field-ref index.
    pub fn resolved_field(&self, idx: u32) -> Option<FieldId> {
        match self.fields[idx as usize].load(Ordering::Acquire) {
            0 => None,
            v => Some(FieldId(v - 1)),
        }
    }

    /// Record a resolved field (idempotent).
    pub fn put_field(&self, idx: u32, id: FieldId) {
        self.fields[idx as usize].store(id.0 + 1, Ordering::Release);
    }
}
