//! Sorted, deduplicated identity set
//!
//! The set-semantics counterpart of [`crate::ref_table::ReferenceTable`]:
//! membership by identity, kept sorted for binary search, duplicate
//! insertion is a no-op.

use core_types::ObjRef;

/// A sorted set of object references.
#[derive(Debug, Default)]
pub struct PointerSet {
    entries: Vec<ObjRef>,
}

impl PointerSet {
    /// New empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert; returns false if the reference was already present.
    pub fn insert(&mut self, obj: ObjRef) -> bool {
        match self.entries.binary_search(&obj) {
            Ok(_) => false,
            Err(pos) => {
                self.entries.insert(pos, obj);
                true
            }
        }
    }

    /// Remove; returns false if the reference was not present.
    pub fn remove(&mut self, obj: ObjRef) -> bool {
        match self.entries.binary_search(&obj) {
            Ok(pos) => {
                self.entries.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Membership test.
    pub fn contains(&self, obj: ObjRef) -> bool {
        self.entries.binary_search(&obj).is_ok()
    }

    /// Entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in handle order.
    pub fn iter(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.entries.iter().copied()
    }
}
