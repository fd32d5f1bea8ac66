//! Unit tests for reference bookkeeping

use core_types::{ClassId, ObjRef, PrimitiveType};
use memory_manager::{Heap, PointerSet, ReferenceTable, TrackedAllocs};

#[test]
fn test_reference_table_fifo_lifo_symmetry() {
    // Insertion-order removal drains to empty
    let mut t = ReferenceTable::new(8, 64);
    let refs: Vec<_> = (1..=32u32).map(ObjRef).collect();
    for &r in &refs {
        assert!(t.add(r));
    }
    for &r in &refs {
        assert!(t.remove(0, r));
    }
    assert_eq!(t.len(), 0);

    // Reverse-order removal drains to empty as well
    for &r in &refs {
        t.add(r);
    }
    for &r in refs.iter().rev() {
        assert!(t.remove(0, r));
    }
    assert_eq!(t.len(), 0);
}

#[test]
fn test_reference_table_middle_removal_then_reuse() {
    let mut t = ReferenceTable::new(4, 4);
    t.add(ObjRef(1));
    t.add(ObjRef(2));
    t.add(ObjRef(3));
    t.add(ObjRef(4));
    let cap = t.capacity();

    // Freeing a middle slot and re-inserting must not grow the table
    assert!(t.remove(0, ObjRef(2)));
    assert!(t.add(ObjRef(5)));
    assert_eq!(t.len(), 4);
    assert_eq!(t.capacity(), cap);

    // Removing from the end shrinks the count directly
    assert!(t.remove(0, ObjRef(5)));
    assert_eq!(t.len(), 3);
}

#[test]
fn test_pointer_set_vs_table_duplicates() {
    let mut table = ReferenceTable::new(4, 16);
    let mut set = PointerSet::new();
    for _ in 0..3 {
        table.add(ObjRef(9));
        set.insert(ObjRef(9));
    }
    assert_eq!(table.len(), 3);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_tracked_alloc_roots_visible() {
    let heap = Heap::new(1 << 16);
    let mut tracker = TrackedAllocs::new();

    let obj = heap.alloc_instance(ClassId(0), 1).unwrap();
    tracker.track(obj);
    assert!(tracker.roots().any(|r| r == obj));

    tracker.release(obj);
    assert_eq!(tracker.pinned(), 0);
}

#[test]
fn test_heap_array_accounting() {
    let heap = Heap::new(1 << 16);
    let before = heap.bytes_used();
    heap.alloc_array(ClassId(1), Some(PrimitiveType::Long), 8)
        .unwrap();
    assert!(heap.bytes_used() >= before + 64);
}
