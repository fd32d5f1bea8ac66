//! Allocation tracking
//!
//! A freshly allocated object is unreachable until the interpreter
//! stores it into a register or field; during that window it must be
//! pinned so a concurrent collection cannot sweep it. Each thread owns
//! one tracking table and brackets allocation sites with
//! `track`/`release`.

use core_types::ObjRef;

use crate::ref_table::ReferenceTable;

const TRACK_INITIAL: usize = 16;
const TRACK_MAX: usize = 1024;

/// Per-thread tracked-allocation table.
#[derive(Debug)]
pub struct TrackedAllocs {
    table: ReferenceTable,
}

impl TrackedAllocs {
    /// New empty tracker.
    pub fn new() -> Self {
        Self {
            table: ReferenceTable::new(TRACK_INITIAL, TRACK_MAX),
        }
    }

    /// Pin a freshly allocated object.
    ///
    /// Overflow aborts: losing track of an in-flight allocation would
    /// let the collector sweep a live object, which is unrecoverable.
    pub fn track(&mut self, obj: ObjRef) {
        if !self.table.add(obj) {
            panic!("tracked-allocation table overflow");
        }
    }

    /// Release a pin once the object is reachable elsewhere.
    pub fn release(&mut self, obj: ObjRef) {
        if !obj.is_null() {
            self.table.remove(0, obj);
        }
    }

    /// Number of currently pinned objects.
    pub fn pinned(&self) -> usize {
        self.table.len()
    }

    /// Root-scan iterator for the external collector.
    pub fn roots(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.table.iter_from(0)
    }
}

impl Default for TrackedAllocs {
    fn default() -> Self {
        Self::new()
    }
}
