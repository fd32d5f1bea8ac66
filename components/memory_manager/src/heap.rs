//! Handle-based object heap
//!
//! Objects are addressed by non-zero `ObjRef` handles; the handle table
//! is read-heavy (every field access goes through it) and append-mostly,
//! so it sits behind a sharded reader/writer lock. The tracing
//! collector is external: the heap only allocates, enforces the byte
//! budget, and exposes enough structure for a collector to scan.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use core_types::{ClassId, ObjRef, PrimitiveType};
use crossbeam::sync::ShardedLock;
use parking_lot::Mutex;

use crate::monitor::Monitor;

/// Element storage of one array object.
#[derive(Debug)]
pub enum ArrayData {
    /// Boolean elements, stored 0/1.
    Boolean(Vec<u8>),
    /// Signed byte elements.
    Byte(Vec<i8>),
    /// Unsigned 16-bit char elements.
    Char(Vec<u16>),
    /// Signed short elements.
    Short(Vec<i16>),
    /// 32-bit int elements.
    Int(Vec<i32>),
    /// 64-bit long elements.
    Long(Vec<i64>),
    /// Float elements.
    Float(Vec<f32>),
    /// Double elements.
    Double(Vec<f64>),
    /// Reference elements, stored as raw handles.
    Object(Vec<u32>),
}

impl ArrayData {
    /// Allocate zeroed storage for `len` elements.
    pub fn zeroed(elem: Option<PrimitiveType>, len: usize) -> Self {
        match elem {
            Some(PrimitiveType::Boolean) => ArrayData::Boolean(vec![0; len]),
            Some(PrimitiveType::Byte) => ArrayData::Byte(vec![0; len]),
            Some(PrimitiveType::Char) => ArrayData::Char(vec![0; len]),
            Some(PrimitiveType::Short) => ArrayData::Short(vec![0; len]),
            Some(PrimitiveType::Int) => ArrayData::Int(vec![0; len]),
            Some(PrimitiveType::Long) => ArrayData::Long(vec![0; len]),
            Some(PrimitiveType::Float) => ArrayData::Float(vec![0.0; len]),
            Some(PrimitiveType::Double) => ArrayData::Double(vec![0.0; len]),
            None => ArrayData::Object(vec![0; len]),
        }
    }

    /// Element count.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Boolean(v) => v.len(),
            ArrayData::Byte(v) => v.len(),
            ArrayData::Char(v) => v.len(),
            ArrayData::Short(v) => v.len(),
            ArrayData::Int(v) => v.len(),
            ArrayData::Long(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Double(v) => v.len(),
            ArrayData::Object(v) => v.len(),
        }
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element width in bytes (for budget accounting and
    /// fill-array-data tables).
    pub fn elem_width(&self) -> usize {
        match self {
            ArrayData::Boolean(_) | ArrayData::Byte(_) => 1,
            ArrayData::Char(_) | ArrayData::Short(_) => 2,
            ArrayData::Long(_) | ArrayData::Double(_) => 8,
            _ => 4,
        }
    }
}

/// The typed body of a heap object.
#[derive(Debug)]
pub enum ObjectBody {
    /// A class instance: one 64-bit cell per declared field slot
    /// (wide or not), so volatile wide accesses never tear.
    Instance {
        /// Field storage, indexed by `FieldDef::slot`.
        fields: Box<[AtomicU64]>,
    },
    /// An array; element storage behind the object's own lock.
    Array(Mutex<ArrayData>),
    /// An interned or constructed string.
    Str(Arc<str>),
}

/// One heap object.
#[derive(Debug)]
pub struct HeapObject {
    /// The object's class.
    pub class: ClassId,
    /// Typed payload.
    pub body: ObjectBody,
    /// Reentrant monitor for `monitor-enter`/`monitor-exit`.
    pub monitor: Monitor,
}

impl HeapObject {
    /// Read an instance field cell. Volatile reads take acquire order.
    ///
    /// Panics if the object is not an instance or the slot is out of
    /// range; resolution guarantees both for verified code.
    pub fn read_field(&self, slot: u32, volatile: bool) -> u64 {
        let ObjectBody::Instance { fields } = &self.body else {
            panic!("field access on non-instance object");
        };
        let order = if volatile {
            Ordering::Acquire
        } else {
            Ordering::Relaxed
        };
        fields[slot as usize].load(order)
    }

    /// Write an instance field cell. Volatile writes take release order.
    pub fn write_field(&self, slot: u32, value: u64, volatile: bool) {
        let ObjectBody::Instance { fields } = &self.body else {
            panic!("field access on non-instance object");
        };
        let order = if volatile {
            Ordering::Release
        } else {
            Ordering::Relaxed
        };
        fields[slot as usize].store(value, order);
    }

    /// Array length, or None for non-arrays.
    pub fn array_len(&self) -> Option<usize> {
        match &self.body {
            ObjectBody::Array(data) => Some(data.lock().len()),
            _ => None,
        }
    }

    /// String payload, or None for non-strings.
    pub fn as_str(&self) -> Option<&Arc<str>> {
        match &self.body {
            ObjectBody::Str(s) => Some(s),
            _ => None,
        }
    }
}

const OBJECT_OVERHEAD: usize = 16;

/// The object heap.
#[derive(Debug)]
pub struct Heap {
    objects: ShardedLock<Vec<Option<Arc<HeapObject>>>>,
    bytes_used: AtomicUsize,
    limit: usize,
}

impl Heap {
    /// New heap with the given byte budget.
    pub fn new(limit: usize) -> Self {
        Self {
            objects: ShardedLock::new(Vec::new()),
            bytes_used: AtomicUsize::new(0),
            limit,
        }
    }

    fn charge(&self, bytes: usize) -> bool {
        let mut used = self.bytes_used.load(Ordering::Relaxed);
        loop {
            if used + bytes > self.limit {
                log::warn!(
                    "allocation of {} bytes exceeds heap budget ({}/{} used)",
                    bytes,
                    used,
                    self.limit
                );
                return false;
            }
            match self.bytes_used.compare_exchange_weak(
                used,
                used + bytes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => used = actual,
            }
        }
    }

    fn insert(&self, obj: HeapObject) -> ObjRef {
        let mut table = self.objects.write().expect("heap index poisoned");
        table.push(Some(Arc::new(obj)));
        ObjRef(table.len() as u32)
    }

    /// Allocate a zero-initialized instance of `class` with
    /// `field_slots` field cells. Returns None when the budget is
    /// exhausted (the caller raises the out-of-memory exception).
    pub fn alloc_instance(&self, class: ClassId, field_slots: u32) -> Option<ObjRef> {
        let bytes = OBJECT_OVERHEAD + field_slots as usize * 8;
        if !self.charge(bytes) {
            return None;
        }
        let fields = (0..field_slots).map(|_| AtomicU64::new(0)).collect();
        Some(self.insert(HeapObject {
            class,
            body: ObjectBody::Instance { fields },
            monitor: Monitor::new(),
        }))
    }

    /// Allocate a zeroed array. `elem` None means reference elements.
    pub fn alloc_array(
        &self,
        class: ClassId,
        elem: Option<PrimitiveType>,
        len: usize,
    ) -> Option<ObjRef> {
        let data = ArrayData::zeroed(elem, len);
        let bytes = OBJECT_OVERHEAD + data.elem_width() * len;
        if !self.charge(bytes) {
            return None;
        }
        Some(self.insert(HeapObject {
            class,
            body: ObjectBody::Array(Mutex::new(data)),
            monitor: Monitor::new(),
        }))
    }

    /// Allocate a string object sharing `text`.
    pub fn alloc_string(&self, class: ClassId, text: Arc<str>) -> Option<ObjRef> {
        let bytes = OBJECT_OVERHEAD + text.len();
        if !self.charge(bytes) {
            return None;
        }
        Some(self.insert(HeapObject {
            class,
            body: ObjectBody::Str(text),
            monitor: Monitor::new(),
        }))
    }

    /// Look up a handle. None for the null handle or a stale handle.
    pub fn get(&self, handle: ObjRef) -> Option<Arc<HeapObject>> {
        if handle.is_null() {
            return None;
        }
        let table = self.objects.read().expect("heap index poisoned");
        table.get(handle.raw() as usize - 1)?.clone()
    }

    /// Class of the referenced object.
    pub fn class_of(&self, handle: ObjRef) -> Option<ClassId> {
        self.get(handle).map(|o| o.class)
    }

    /// Current byte usage.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used.load(Ordering::Relaxed)
    }

    /// Number of live handles.
    pub fn object_count(&self) -> usize {
        let table = self.objects.read().expect("heap index poisoned");
        table.iter().filter(|slot| slot.is_some()).count()
    }
}
