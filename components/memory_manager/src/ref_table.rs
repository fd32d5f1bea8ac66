//! Reference tables
//!
//! A reference table pins objects reachable from native or internal VM
//! contexts so an external collector treats them as roots. Entries are
//! appended at a cursor; removal searches backwards from the cursor
//! (the victim is usually at or near the top), shrinking directly when
//! it is the top entry and shifting the tail down otherwise. Capacity
//! doubles up to a hard bound; hitting the bound fails the add.
//!
//! Duplicate insertions of one reference occupy distinct slots on
//! purpose: segment-based release depends on it. Callers that want set
//! semantics use [`crate::pointer_set::PointerSet`].

use core_types::ObjRef;

/// A growable, compacting table of object references.
#[derive(Debug)]
pub struct ReferenceTable {
    table: Vec<ObjRef>,
    max_entries: usize,
}

impl ReferenceTable {
    /// New table with `initial` slots reserved and a hard bound of
    /// `max_entries`.
    pub fn new(initial: usize, max_entries: usize) -> Self {
        debug_assert!(initial > 0 && initial <= max_entries);
        Self {
            table: Vec::with_capacity(initial),
            max_entries,
        }
    }

    /// Append a reference. Fails (with a dump) when the bound is hit.
    pub fn add(&mut self, obj: ObjRef) -> bool {
        debug_assert!(!obj.is_null());
        if self.table.len() == self.table.capacity() {
            if self.table.len() == self.max_entries {
                log::warn!("reference table overflow (max={})", self.max_entries);
                return false;
            }
            let new_cap = (self.table.capacity() * 2).min(self.max_entries);
            self.table.reserve_exact(new_cap - self.table.len());
        }
        self.table.push(obj);
        true
    }

    /// Remove one occurrence of `obj`, searching backwards from the
    /// cursor down to `bottom`. The most recent insertion wins when the
    /// table holds duplicates.
    pub fn remove(&mut self, bottom: usize, obj: ObjRef) -> bool {
        let top = self.table.len();
        debug_assert!(bottom <= top);
        for i in (bottom..top).rev() {
            if self.table[i] == obj {
                if i == top - 1 {
                    self.table.pop();
                } else {
                    // Mid-table removal: shift the tail down one slot
                    self.table.remove(i);
                }
                return true;
            }
        }
        log::warn!("attempt to remove untracked reference {:?}", obj);
        false
    }

    /// Current entry count (the cursor).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Allocated capacity, for growth assertions in tests.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Iterate entries from `bottom` to the cursor (GC root scan and
    /// segment teardown).
    pub fn iter_from(&self, bottom: usize) -> impl Iterator<Item = ObjRef> + '_ {
        self.table[bottom..].iter().copied()
    }

    /// Drop every entry at or above `bottom` (segment pop).
    pub fn truncate(&mut self, bottom: usize) {
        self.table.truncate(bottom);
    }
}
