//! Breakpoint instrumentation
//!
//! The debugger arms a location by recording the opcode it would have
//! overwritten with the reserved trap; the bytecode itself stays
//! immutable (see the design notes: the indirection table replaces
//! page-permission games). The interpreter's fetch path consults the
//! table only while at least one breakpoint is armed, keeping the
//! uninstrumented fast path to a single atomic load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use class_model::MethodDef;
use core_types::{MethodId, ThreadId};
use parking_lot::RwLock;
use runtime_core::{RuntimeContext, VmThread};

/// Debugger callbacks the interpreter fires at trap sites.
pub trait DebugHooks: Send + Sync {
    /// An armed location is about to execute. The hook may bump
    /// suspend counts (per the event's suspend policy); the thread
    /// performs a suspend check immediately after.
    fn on_breakpoint(&self, ctx: &RuntimeContext, thread: &VmThread, method: MethodId, pc: u32);

    /// A thread finished its outermost invocation with an uncaught
    /// exception.
    fn on_thread_death(&self, ctx: &RuntimeContext, thread_id: ThreadId);
}

/// The armed-breakpoint table.
#[derive(Debug, Default)]
pub struct InstrumentationTable {
    armed: AtomicUsize,
    table: RwLock<HashMap<(MethodId, u32), u8>>,
}

impl InstrumentationTable {
    /// New table with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any breakpoint is armed (the per-instruction gate).
    #[inline]
    pub fn active(&self) -> bool {
        self.armed.load(Ordering::Acquire) != 0
    }

    /// Arm a location, recording the opcode the trap replaces.
    /// Returns false if the pc does not start an instruction.
    pub fn arm(&self, method: &MethodDef, pc: u32) -> bool {
        let Some(body) = &method.body else {
            return false;
        };
        let Some(&word) = body.insns.get(pc as usize) else {
            return false;
        };
        let original = (word & 0xff) as u8;
        if class_model::opcodes::insn_width(original) == 0 {
            return false;
        }
        let mut table = self.table.write();
        if table.insert((method.id, pc), original).is_none() {
            self.armed.fetch_add(1, Ordering::AcqRel);
        }
        log::debug!("armed breakpoint at {}:{pc}", method.name);
        true
    }

    /// Disarm a location, restoring it to plain execution.
    pub fn disarm(&self, method: MethodId, pc: u32) -> bool {
        let mut table = self.table.write();
        if table.remove(&(method, pc)).is_some() {
            self.armed.fetch_sub(1, Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// The saved original opcode for an armed location.
    pub fn original(&self, method: MethodId, pc: u32) -> Option<u8> {
        self.table.read().get(&(method, pc)).copied()
    }

    /// Disarm everything (session detach).
    pub fn clear(&self) {
        let mut table = self.table.write();
        let removed = table.len();
        table.clear();
        self.armed.fetch_sub(removed, Ordering::AcqRel);
        if removed > 0 {
            log::debug!("cleared {removed} breakpoints");
        }
    }

    /// Number of armed locations.
    pub fn count(&self) -> usize {
        self.armed.load(Ordering::Acquire)
    }
}

/// No-op hooks used when no debugger is attached.
#[derive(Debug, Default)]
pub struct NullHooks;

impl DebugHooks for NullHooks {
    fn on_breakpoint(&self, _: &RuntimeContext, _: &VmThread, _: MethodId, _: u32) {}
    fn on_thread_death(&self, _: &RuntimeContext, _: ThreadId) {}
}
