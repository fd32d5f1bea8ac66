//! Linked runtime class metadata
//!
//! `ClassDef`/`MethodDef`/`FieldDef` are built by the linker from a
//! unit's `ClassItem`s (or registered directly for built-in classes).
//! They are immutable after registration except for three runtime
//! fields: static storage, the initialization state machine, and the
//! lazily allocated class object handle.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use core_types::{ClassId, FieldId, MethodId, ObjRef, PrimitiveType, ThreadId, UnitId};
use parking_lot::{Condvar, Mutex};

use crate::flags;
use crate::unit::MethodBody;

/// Lifecycle of a class, driven by the initializer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassStatus {
    /// Registered, not yet verified.
    Idle,
    /// Verification done (assumed for loaded units).
    Verified,
    /// A thread is running the static initializer.
    Initializing,
    /// Ready for use.
    Initialized,
    /// The initializer failed; every toucher gets the failure.
    Error,
}

/// What the caller of [`InitState::begin`] must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitAction {
    /// Class is initialized; proceed.
    Ready,
    /// This thread owns initialization and must run `<clinit>`.
    Run,
    /// Re-entered from this thread's own initializer; proceed without
    /// waiting (waiting here would self-deadlock).
    Reentrant,
    /// A previous initializer failed.
    Failed,
}

#[derive(Debug)]
struct InitInner {
    status: ClassStatus,
    init_thread: Option<ThreadId>,
}

/// Per-class initialization state machine.
///
/// A plain recursive mutex is not enough here: the initializing thread
/// must pass straight through its own reentry while every other thread
/// actually blocks until the state settles.
#[derive(Debug)]
pub struct InitState {
    inner: Mutex<InitInner>,
    cond: Condvar,
}

impl InitState {
    /// New state machine in `Idle`.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InitInner {
                status: ClassStatus::Idle,
                init_thread: None,
            }),
            cond: Condvar::new(),
        }
    }

    /// Current status, racy by nature (snapshot only).
    pub fn snapshot(&self) -> ClassStatus {
        self.inner.lock().status
    }

    /// Enter the initialization protocol on behalf of `self_tid`.
    ///
    /// Blocks while another thread is initializing. Returns what the
    /// caller must do; on [`InitAction::Run`] the caller owns the
    /// transition and must finish with [`InitState::complete`].
    pub fn begin(&self, self_tid: ThreadId) -> InitAction {
        let mut inner = self.inner.lock();
        loop {
            match inner.status {
                ClassStatus::Initialized => return InitAction::Ready,
                ClassStatus::Error => return InitAction::Failed,
                ClassStatus::Initializing => {
                    if inner.init_thread == Some(self_tid) {
                        return InitAction::Reentrant;
                    }
                    self.cond.wait(&mut inner);
                }
                ClassStatus::Idle | ClassStatus::Verified => {
                    inner.status = ClassStatus::Initializing;
                    inner.init_thread = Some(self_tid);
                    return InitAction::Run;
                }
            }
        }
    }

    /// Finish initialization, waking every waiter.
    pub fn complete(&self, ok: bool) {
        let mut inner = self.inner.lock();
        debug_assert_eq!(inner.status, ClassStatus::Initializing);
        inner.status = if ok {
            ClassStatus::Initialized
        } else {
            ClassStatus::Error
        };
        inner.init_thread = None;
        self.cond.notify_all();
    }

    /// Force a terminal state without the protocol (built-in classes).
    pub fn mark_initialized(&self) {
        let mut inner = self.inner.lock();
        inner.status = ClassStatus::Initialized;
        inner.init_thread = None;
    }
}

impl Default for InitState {
    fn default() -> Self {
        Self::new()
    }
}

/// A linked field.
#[derive(Debug)]
pub struct FieldDef {
    /// Registry id.
    pub id: FieldId,
    /// Declaring class.
    pub class: ClassId,
    /// Field name.
    pub name: Arc<str>,
    /// Primitive type, or None for a reference field.
    pub ptype: Option<PrimitiveType>,
    /// Access flags.
    pub access_flags: u32,
    /// Instance fields: slot offset in the object's field block.
    /// Static fields: index into the class's static storage.
    pub slot: u32,
}

impl FieldDef {
    /// Whether the field is static.
    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    /// Whether every access needs acquire/release ordering.
    pub fn is_volatile(&self) -> bool {
        self.access_flags & flags::ACC_VOLATILE != 0
    }

    /// Register slots a value of this field's type occupies.
    pub fn slot_width(&self) -> usize {
        self.ptype.map_or(1, PrimitiveType::slot_width)
    }
}

/// A linked method.
#[derive(Debug)]
pub struct MethodDef {
    /// Registry id.
    pub id: MethodId,
    /// Declaring class.
    pub class: ClassId,
    /// Method name.
    pub name: Arc<str>,
    /// Shorty signature (return char first).
    pub shorty: Arc<str>,
    /// Access flags.
    pub access_flags: u32,
    /// Slot in the declaring class's vtable, for virtual methods.
    pub vtable_index: Option<u16>,
    /// Unit the body's pool indices resolve against.
    pub unit: Option<UnitId>,
    /// Bytecode, absent for native/abstract methods.
    pub body: Option<Arc<MethodBody>>,
    /// Cached native-call argument hints, 0 = not yet computed.
    pub arg_info: AtomicU32,
}

impl MethodDef {
    /// Whether the method dispatches through the native registry.
    pub fn is_native(&self) -> bool {
        self.access_flags & flags::ACC_NATIVE != 0
    }

    /// Whether the method is static.
    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    /// Whether the method has no body of its own.
    pub fn is_abstract(&self) -> bool {
        self.access_flags & flags::ACC_ABSTRACT != 0
    }

    /// Argument register slots, including the receiver for instance
    /// methods. For interpreted methods this equals `ins_size`.
    pub fn ins_slot_count(&self) -> usize {
        if let Some(body) = &self.body {
            return body.ins_size as usize;
        }
        let mut slots = if self.is_static() { 0 } else { 1 };
        for &c in self.shorty.as_bytes().iter().skip(1) {
            slots += if core_types::primitive::shorty_is_wide(c) {
                2
            } else {
                1
            };
        }
        slots
    }

    /// The shorty's return character.
    pub fn return_char(&self) -> u8 {
        self.shorty.as_bytes()[0]
    }
}

/// A linked class.
#[derive(Debug)]
pub struct ClassDef {
    /// Registry id.
    pub id: ClassId,
    /// Internal name, e.g. `core/Object`.
    pub name: Arc<str>,
    /// Defining unit; None for built-ins.
    pub unit: Option<UnitId>,
    /// Superclass, None only for the root class.
    pub superclass: Option<ClassId>,
    /// Implemented interfaces.
    pub interfaces: Vec<ClassId>,
    /// Access flags.
    pub access_flags: u32,
    /// Total instance field slots including superclasses.
    pub instance_slots: u32,
    /// Declared instance fields.
    pub instance_fields: Vec<FieldId>,
    /// Declared static fields.
    pub static_fields: Vec<FieldId>,
    /// Declared methods.
    pub methods: Vec<MethodId>,
    /// Virtual dispatch table (superclass slots first).
    pub vtable: Vec<MethodId>,
    /// Static field storage, one 64-bit cell per static slot.
    pub statics: Box<[AtomicU64]>,
    /// Static initializer, if declared.
    pub clinit: Option<MethodId>,
    /// Initialization state machine.
    pub init: InitState,
    /// Heap handle of the class object, allocated on first use.
    pub class_obj: OnceLock<ObjRef>,
}

impl ClassDef {
    /// Whether this class is an interface.
    pub fn is_interface(&self) -> bool {
        self.access_flags & flags::ACC_INTERFACE != 0
    }

    /// Read a static cell. Volatile reads take acquire ordering.
    pub fn read_static(&self, slot: u32, volatile: bool) -> u64 {
        let order = if volatile {
            Ordering::Acquire
        } else {
            Ordering::Relaxed
        };
        self.statics[slot as usize].load(order)
    }

    /// Write a static cell. Volatile writes take release ordering.
    pub fn write_static(&self, slot: u32, value: u64, volatile: bool) {
        let order = if volatile {
            Ordering::Release
        } else {
            Ordering::Relaxed
        };
        self.statics[slot as usize].store(value, order);
    }
}
