//! The execution engine
//!
//! `Machine` owns one interpreter activation: the frame region, the
//! last invoke result, and the caught-exception slot. Opcode handlers
//! are free functions over the machine so both dispatch strategies
//! (single `match` and handler table) share them; see
//! [`crate::dispatch`].
//!
//! Handlers advance the pc themselves, by the instruction's fixed
//! width or by a computed branch, and signal failure by parking a
//! pending exception on the thread and returning `Err(ExceptionRaised)`,
//! which the step loop routes into the shared handler search.

use std::sync::atomic::{fence, Ordering};
use std::sync::Arc;

use arrayvec::ArrayVec;
use class_model::builder::payload_len;
use class_model::opcodes::{self as op, insn_name};
use class_model::{flags, MethodDef};
use core_types::{DispatchKind, ExecResult, ExceptionRaised, JValue, ObjRef};
use memory_manager::{ArrayData, HeapObject, ObjectBody};
use native_bridge::CallStrategy;
use runtime_core::exception::{
    throw, throw_arithmetic, throw_array_bounds, throw_class_cast, throw_null_pointer,
    throw_out_of_memory, throw_stack_overflow,
};
use runtime_core::{RuntimeContext, ThreadStatus, VmThread};

use crate::decode::*;
use crate::frame::FrameStack;
use crate::instrumentation::{DebugHooks, InstrumentationTable};

/// One interpreter activation.
pub struct Machine<'a> {
    /// The runtime context.
    pub ctx: &'a RuntimeContext,
    /// The executing thread.
    pub thread: &'a mut VmThread,
    /// The frame region.
    pub stack: FrameStack,
    /// Result of the most recent invoke, for `move-result*`.
    pub retval: JValue,
    /// Exception delivered to a handler, for `move-exception`.
    pub caught: Option<ObjRef>,
    pub(crate) strategy: &'a dyn CallStrategy,
    pub(crate) instrumentation: &'a InstrumentationTable,
    pub(crate) hooks: &'a dyn DebugHooks,
    pub(crate) dispatch: DispatchKind,
    pub(crate) entry_floor: usize,
    pub(crate) done: bool,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(
        ctx: &'a RuntimeContext,
        thread: &'a mut VmThread,
        strategy: &'a dyn CallStrategy,
        instrumentation: &'a InstrumentationTable,
        hooks: &'a dyn DebugHooks,
        dispatch: DispatchKind,
    ) -> Self {
        Self {
            stack: FrameStack::new(ctx.options.stack_region_slots),
            ctx,
            thread,
            retval: JValue::Void,
            caught: None,
            strategy,
            instrumentation,
            hooks,
            dispatch,
            entry_floor: 0,
            done: false,
        }
    }

    /// Run until the entry frame returns; the result is the entry
    /// method's return value. An uncaught exception surfaces as `Err`
    /// with the object still pending on the thread.
    pub fn run(&mut self) -> ExecResult<JValue> {
        debug_assert!(self.stack.depth() == self.entry_floor + 1);
        while !self.done {
            self.step()?;
        }
        Ok(self.retval)
    }

    /// One fetch/decode/dispatch/execute iteration.
    fn step(&mut self) -> ExecResult<()> {
        self.suspend_poll();

        let frame = self.stack.current();
        let word = frame.body.insns[frame.pc];
        let mut opcode = inst_op(word);

        // Breakpoint indirection: an armed pc notifies the debugger and
        // re-dispatches the recorded original opcode
        if self.instrumentation.active() {
            let (method_id, pc) = (frame.method.id, frame.pc as u32);
            if let Some(original) = self.instrumentation.original(method_id, pc) {
                self.hooks
                    .on_breakpoint(self.ctx, self.thread, method_id, pc);
                self.suspend_poll();
                opcode = original;
            }
        }
        if opcode == op::OP_BREAKPOINT {
            panic!("stray trap opcode outside the instrumentation table");
        }

        log::trace!(
            "pc={} {}",
            self.stack.current().pc,
            insn_name(opcode)
        );
        if let Err(ExceptionRaised) = crate::dispatch::execute(self, opcode, word) {
            self.unwind()?;
        }
        Ok(())
    }

    /// The configured dispatch strategy.
    pub fn dispatch_kind(&self) -> DispatchKind {
        self.dispatch
    }

    /// Safepoint: cheap per-instruction poll of the suspend count.
    #[inline]
    pub(crate) fn suspend_poll(&mut self) {
        if self.thread.control.suspend_pending() {
            let control = self.thread.control.clone();
            let stack = &self.stack;
            self.ctx.threads.park_at_safepoint(&control, || stack.snapshot());
        }
    }

    // ---- register/word helpers used by the handlers ----

    #[inline]
    pub(crate) fn word(&self, off: usize) -> u16 {
        let frame = self.stack.current();
        frame.body.insns[frame.pc + off]
    }

    #[inline]
    pub(crate) fn advance(&mut self, width: usize) {
        self.stack.current_mut().pc += width;
    }

    /// Relative branch from the current instruction; backward branches
    /// are safepoints.
    pub(crate) fn branch(&mut self, offset: i32) {
        let frame = self.stack.current_mut();
        frame.pc = (frame.pc as i64 + offset as i64) as usize;
        if offset <= 0 {
            self.suspend_poll();
        }
    }

    /// Heap object for a register's handle, raising NPE on null.
    pub(crate) fn obj_or_npe(
        &mut self,
        handle: ObjRef,
        what: &'static str,
    ) -> ExecResult<Arc<HeapObject>> {
        if handle.is_null() {
            return Err(throw_null_pointer(self.ctx, self.thread, what));
        }
        match self.ctx.heap.get(handle) {
            Some(obj) => Ok(obj),
            None => panic!("stale object handle {handle:?}"),
        }
    }

    // ---- invocation ----

    /// Execute an invoke instruction. `word` is the first code unit;
    /// the method index and argument registers follow.
    pub(crate) fn do_invoke(&mut self, opcode: u8, word: u16) -> ExecResult<()> {
        let method_idx = self.word(1) as u32;
        let unit = self.stack.current().unit;

        // Collect raw outgoing argument words
        let mut args: ArrayVec<u32, 5> = ArrayVec::new();
        let range = matches!(opcode, 0x74..=0x78);
        let range_args: Vec<u32>;
        let arg_words: &[u32] = if range {
            let count = inst_aa(word);
            let first = self.word(2) as usize;
            range_args = self.stack.reg_slice(first, count).to_vec();
            &range_args
        } else {
            let count = inst_b(word);
            let regs_word = self.word(2);
            for i in 0..count.min(4) {
                args.push(self.stack.reg(((regs_word >> (4 * i)) & 0xf) as usize));
            }
            if count == 5 {
                args.push(self.stack.reg(inst_a(word)));
            }
            &args
        };

        let resolved = resolver::resolve_method(self.ctx, self.thread, unit, method_idx)?;
        let target = self.select_target(opcode, &resolved, arg_words)?;

        log::trace!("invoke {} ({} args)", target.name, arg_words.len());
        if target.is_native() {
            let arg_words = arg_words.to_vec();
            self.retval = native_bridge::invoke_native(
                self.ctx,
                self.thread,
                &target,
                &arg_words,
                self.strategy,
            )?;
            self.advance(3);
            return Ok(());
        }

        let Some(body) = target.body.clone() else {
            return Err(throw(
                self.ctx,
                self.thread,
                self.ctx.well_known().linkage,
                &format!("abstract method {} invoked", target.name),
            ));
        };
        let target_unit = target.unit.unwrap_or(unit);
        let arg_words = arg_words.to_vec();
        if !self.stack.push(target.clone(), body, target_unit) {
            return Err(throw_stack_overflow(self.ctx, self.thread));
        }
        self.stack.store_ins(&arg_words);

        if target.access_flags & flags::ACC_SYNCHRONIZED != 0 {
            let lock_obj = if target.is_static() {
                resolver::class_object(self.ctx, self.thread, target.class)
                    .inspect_err(|_| {
                        self.stack.pop();
                    })?
            } else {
                ObjRef::from_raw(arg_words[0])
            };
            self.enter_monitor(lock_obj)?;
            self.stack.current_mut().locked = Some(lock_obj);
        }
        Ok(())
    }

    /// Pick the concrete target for an invoke kind.
    fn select_target(
        &mut self,
        opcode: u8,
        resolved: &Arc<MethodDef>,
        arg_words: &[u32],
    ) -> ExecResult<Arc<MethodDef>> {
        let kind = opcode & 0x0f; // virtual/super/direct/static/interface share low nibbles
        match kind {
            // invoke-static
            0x01 | 0x07 => {
                resolver::ensure_initialized(self.ctx, self.thread, resolved.class)?;
                Ok(resolved.clone())
            }
            // invoke-direct
            0x00 | 0x06 => {
                let recv = ObjRef::from_raw(*arg_words.first().unwrap_or(&0));
                if recv.is_null() {
                    return Err(throw_null_pointer(self.ctx, self.thread, &resolved.name));
                }
                Ok(resolved.clone())
            }
            // invoke-virtual
            0x0e | 0x04 => {
                let recv = ObjRef::from_raw(*arg_words.first().unwrap_or(&0));
                let obj = self.obj_or_npe(recv, "invoke-virtual receiver")?;
                let slot = resolved
                    .vtable_index
                    .expect("virtual call to direct method") as usize;
                let class = self.ctx.class(obj.class);
                Ok(self.ctx.method(class.vtable[slot]))
            }
            // invoke-super: dispatch from the caller class's superclass
            0x0f | 0x05 => {
                let recv = ObjRef::from_raw(*arg_words.first().unwrap_or(&0));
                if recv.is_null() {
                    return Err(throw_null_pointer(self.ctx, self.thread, &resolved.name));
                }
                let caller_class = self.ctx.class(self.stack.current().method.class);
                let sup = self
                    .ctx
                    .class(caller_class.superclass.expect("super call from root"));
                let slot = resolved
                    .vtable_index
                    .expect("super call to direct method") as usize;
                Ok(self.ctx.method(sup.vtable[slot]))
            }
            // invoke-interface: search the receiver's hierarchy
            0x02 | 0x08 => {
                let recv = ObjRef::from_raw(*arg_words.first().unwrap_or(&0));
                let obj = self.obj_or_npe(recv, "invoke-interface receiver")?;
                let mut cursor = Some(obj.class);
                while let Some(id) = cursor {
                    let class = self.ctx.class(id);
                    for &mid in &class.methods {
                        let m = self.ctx.method(mid);
                        if m.name == resolved.name && m.shorty == resolved.shorty {
                            return Ok(m);
                        }
                    }
                    cursor = class.superclass;
                }
                Err(throw(
                    self.ctx,
                    self.thread,
                    self.ctx.well_known().linkage,
                    &format!("interface method {} not implemented", resolved.name),
                ))
            }
            _ => panic!("invoke kind for opcode 0x{opcode:02x}"),
        }
    }

    /// Return from the current frame into the caller (or finish the
    /// activation at the entry floor).
    pub(crate) fn return_from_frame(&mut self) -> ExecResult<()> {
        let frame = self.stack.pop().expect("return without a frame");
        if let Some(lock) = frame.locked {
            self.exit_monitor(lock)?;
        }
        // Constructor return publishes final fields before the new
        // object can escape to another thread
        if &*frame.method.name == "<init>" {
            fence(Ordering::Release);
        }
        if self.stack.depth() == self.entry_floor {
            self.done = true;
        } else {
            // The caller's pc still points at its invoke instruction
            self.advance(3);
            self.suspend_poll();
        }
        Ok(())
    }

    // ---- monitors ----

    pub(crate) fn enter_monitor(&mut self, handle: ObjRef) -> ExecResult<()> {
        let obj = self.obj_or_npe(handle, "monitor-enter")?;
        let tid = self.thread.id();
        if !obj.monitor.try_enter(tid) {
            // Contended: drop the mutator hold so a suspend-all cannot
            // deadlock on this thread, then block
            self.thread.control.set_status(ThreadStatus::Monitor);
            self.ctx.threads.mutator.unlock_shared();
            obj.monitor.enter(tid);
            self.ctx.threads.mutator.lock_shared();
            self.thread.control.set_status(ThreadStatus::Running);
            self.suspend_poll();
        }
        Ok(())
    }

    pub(crate) fn exit_monitor(&mut self, handle: ObjRef) -> ExecResult<()> {
        let obj = self.obj_or_npe(handle, "monitor-exit")?;
        if !obj.monitor.exit(self.thread.id()) {
            return Err(throw(
                self.ctx,
                self.thread,
                self.ctx.well_known().illegal_monitor_state,
                "monitor not owned on exit",
            ));
        }
        Ok(())
    }

    // ---- exception delivery ----

    /// The shared "exception thrown" path: walk the current method's
    /// exception table from the faulting pc outward, popping frames
    /// until a handler matches. Uncaught at the entry floor returns
    /// `Err` with the exception still pending.
    pub(crate) fn unwind(&mut self) -> ExecResult<()> {
        let thrown = self
            .thread
            .pending_exception
            .expect("unwind without a pending exception");
        let thrown_class = self
            .ctx
            .heap
            .class_of(thrown)
            .expect("pending exception is stale");

        loop {
            if let Some(handler_pc) = self.find_handler(thrown_class)? {
                self.stack.current_mut().pc = handler_pc as usize;
                self.thread.take_pending();
                self.caught = Some(thrown);
                return Ok(());
            }
            let frame = self.stack.pop().expect("unwind past the frame floor");
            if let Some(lock) = frame.locked {
                // Releasing the monitor must not mask the in-flight
                // exception, even if the release itself fails
                let saved = self.thread.take_pending();
                let _ = self.exit_monitor(lock);
                self.thread.pending_exception = saved;
            }
            if self.stack.depth() == self.entry_floor {
                log::debug!(
                    "uncaught {} leaving activation",
                    runtime_core::exception::describe(self.ctx, thrown)
                );
                return Err(ExceptionRaised);
            }
        }
    }

    /// First matching handler in the current frame, innermost range
    /// first. Catch-type resolution must not disturb the in-flight
    /// exception, so the pending slot is parked around it.
    fn find_handler(&mut self, thrown_class: core_types::ClassId) -> ExecResult<Option<u32>> {
        let frame = self.stack.current();
        let pc = frame.pc as u32;
        let unit = frame.unit;
        let tries = frame.body.tries.clone();
        for item in &tries {
            if !item.covers(pc) {
                continue;
            }
            for handler in &item.handlers {
                match handler.catch_type {
                    None => return Ok(Some(handler.handler_pc)),
                    Some(type_idx) => {
                        let saved = self.thread.take_pending();
                        let resolved =
                            resolver::resolve_class(self.ctx, self.thread, unit, type_idx);
                        self.thread.pending_exception = saved;
                        match resolved {
                            Ok(catch_class)
                                if self.ctx.is_assignable(catch_class, thrown_class) =>
                            {
                                return Ok(Some(handler.handler_pc));
                            }
                            Ok(_) => {}
                            Err(ExceptionRaised) => {
                                log::warn!("catch type {type_idx} failed to resolve");
                            }
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    // ---- arithmetic helpers ----

    pub(crate) fn div_i32(&mut self, a: i32, b: i32) -> ExecResult<i32> {
        if b == 0 {
            return Err(throw_arithmetic(self.ctx, self.thread));
        }
        Ok(a.wrapping_div(b))
    }

    pub(crate) fn rem_i32(&mut self, a: i32, b: i32) -> ExecResult<i32> {
        if b == 0 {
            return Err(throw_arithmetic(self.ctx, self.thread));
        }
        Ok(a.wrapping_rem(b))
    }

    pub(crate) fn div_i64(&mut self, a: i64, b: i64) -> ExecResult<i64> {
        if b == 0 {
            return Err(throw_arithmetic(self.ctx, self.thread));
        }
        Ok(a.wrapping_div(b))
    }

    pub(crate) fn rem_i64(&mut self, a: i64, b: i64) -> ExecResult<i64> {
        if b == 0 {
            return Err(throw_arithmetic(self.ctx, self.thread));
        }
        Ok(a.wrapping_rem(b))
    }
}

/// Three-way float compare with the explicit NaN tie-break: `nan_bias`
/// is the result when either operand is NaN (-1 for `cmpl`, +1 for
/// `cmpg`).
pub(crate) fn fp_compare<T: PartialOrd>(a: T, b: T, nan_bias: i32) -> i32 {
    match a.partial_cmp(&b) {
        Some(std::cmp::Ordering::Less) => -1,
        Some(std::cmp::Ordering::Equal) => 0,
        Some(std::cmp::Ordering::Greater) => 1,
        None => nan_bias,
    }
}

// ===================== opcode handlers =====================
//
// All handlers share the signature used by the threaded table; the
// portable `match` calls the same functions. `opcode` is the effective
// opcode (it differs from the word's low byte only under a breakpoint
// trap), `word` the instruction's first code unit.

pub(crate) fn op_unused(m: &mut Machine, opcode: u8, _word: u16) -> ExecResult<()> {
    let _ = m;
    panic!("undefined opcode 0x{opcode:02x} in verified code");
}

pub(crate) fn op_nop(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    // A payload table is skipped as a whole
    if word >> 8 != 0 {
        let frame = m.stack.current();
        let len = payload_len(&frame.body.insns[frame.pc..])
            .expect("corrupt payload table");
        m.advance(len);
    } else {
        m.advance(1);
    }
    Ok(())
}

pub(crate) fn op_move(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    // move / move-object share untyped register semantics
    let (dst, src, width) = match opcode {
        op::OP_MOVE | op::OP_MOVE_OBJECT => (inst_a(word), inst_b(word), 1),
        op::OP_MOVE_FROM16 | op::OP_MOVE_OBJECT_FROM16 => {
            (inst_aa(word), m.word(1) as usize, 2)
        }
        _ => (m.word(1) as usize, m.word(2) as usize, 3),
    };
    let value = m.stack.reg(src);
    m.stack.set_reg(dst, value);
    m.advance(width);
    Ok(())
}

pub(crate) fn op_move_wide(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let (dst, src, width) = match opcode {
        op::OP_MOVE_WIDE => (inst_a(word), inst_b(word), 1),
        op::OP_MOVE_WIDE_FROM16 => (inst_aa(word), m.word(1) as usize, 2),
        _ => (m.word(1) as usize, m.word(2) as usize, 3),
    };
    let value = m.stack.reg_wide(src);
    m.stack.set_reg_wide(dst, value);
    m.advance(width);
    Ok(())
}

pub(crate) fn op_move_result(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_aa(word);
    match opcode {
        op::OP_MOVE_RESULT_WIDE => {
            let raw = match m.retval {
                JValue::Long(v) => v as u64,
                JValue::Double(v) => v.to_bits(),
                other => panic!("move-result-wide after {other:?}"),
            };
            m.stack.set_reg_wide(dst, raw);
        }
        _ => {
            let raw = m.retval.low_word();
            m.stack.set_reg(dst, raw);
        }
    }
    m.advance(1);
    Ok(())
}

pub(crate) fn op_move_exception(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let obj = m
        .caught
        .take()
        .expect("move-exception outside a handler prologue");
    m.stack.set_reg(inst_aa(word), obj.raw());
    m.advance(1);
    Ok(())
}

pub(crate) fn op_return(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    m.retval = match opcode {
        op::OP_RETURN_VOID => JValue::Void,
        op::OP_RETURN_WIDE => {
            let raw = m.stack.reg_wide(inst_aa(word));
            match m.stack.current().method.return_char() {
                b'D' => JValue::Double(f64::from_bits(raw)),
                _ => JValue::Long(raw as i64),
            }
        }
        op::OP_RETURN_OBJECT => JValue::Object(m.stack.reg_obj(inst_aa(word))),
        _ => {
            let raw = m.stack.reg(inst_aa(word));
            match m.stack.current().method.return_char() {
                b'F' => JValue::Float(f32::from_bits(raw)),
                _ => JValue::Int(raw as i32),
            }
        }
    };
    m.return_from_frame()
}

pub(crate) fn op_const(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    match opcode {
        op::OP_CONST_4 => {
            let dst = inst_a(word);
            m.stack.set_reg(dst, inst_b_signed(word) as u32);
            m.advance(1);
        }
        op::OP_CONST_16 => {
            let dst = inst_aa(word);
            let value = m.word(1) as i16 as i32;
            m.stack.set_reg(dst, value as u32);
            m.advance(2);
        }
        op::OP_CONST => {
            let dst = inst_aa(word);
            let value = words_i32(m.word(1), m.word(2));
            m.stack.set_reg(dst, value as u32);
            m.advance(3);
        }
        op::OP_CONST_HIGH16 => {
            let dst = inst_aa(word);
            let value = (m.word(1) as u32) << 16;
            m.stack.set_reg(dst, value);
            m.advance(2);
        }
        op::OP_CONST_WIDE_16 => {
            let dst = inst_aa(word);
            let value = m.word(1) as i16 as i64;
            m.stack.set_reg_wide(dst, value as u64);
            m.advance(2);
        }
        op::OP_CONST_WIDE_32 => {
            let dst = inst_aa(word);
            let value = words_i32(m.word(1), m.word(2)) as i64;
            m.stack.set_reg_wide(dst, value as u64);
            m.advance(3);
        }
        op::OP_CONST_WIDE => {
            let dst = inst_aa(word);
            let value = words_u64([m.word(1), m.word(2), m.word(3), m.word(4)]);
            m.stack.set_reg_wide(dst, value);
            m.advance(5);
        }
        op::OP_CONST_WIDE_HIGH16 => {
            let dst = inst_aa(word);
            let value = (m.word(1) as u64) << 48;
            m.stack.set_reg_wide(dst, value);
            m.advance(2);
        }
        _ => panic!("const family got {}", insn_name(opcode)),
    }
    Ok(())
}

pub(crate) fn op_const_string(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_aa(word);
    let (idx, width) = if opcode == op::OP_CONST_STRING {
        (m.word(1) as u32, 2)
    } else {
        (words_i32(m.word(1), m.word(2)) as u32, 3)
    };
    let unit = m.stack.current().unit;
    let handle = resolver::resolve_string(m.ctx, m.thread, unit, idx)?;
    m.stack.set_reg(dst, handle.raw());
    m.advance(width);
    Ok(())
}

pub(crate) fn op_const_class(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_aa(word);
    let unit = m.stack.current().unit;
    let class = resolver::resolve_class(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let handle = resolver::class_object(m.ctx, m.thread, class)?;
    m.stack.set_reg(dst, handle.raw());
    m.advance(2);
    Ok(())
}

pub(crate) fn op_monitor(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_aa(word));
    if opcode == op::OP_MONITOR_ENTER {
        m.enter_monitor(handle)?;
    } else {
        m.exit_monitor(handle)?;
    }
    m.advance(1);
    Ok(())
}

pub(crate) fn op_check_cast(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_aa(word));
    let unit = m.stack.current().unit;
    let target = resolver::resolve_class(m.ctx, m.thread, unit, m.word(1) as u32)?;
    if !handle.is_null() {
        let actual = m.ctx.heap.class_of(handle).expect("stale cast operand");
        if !m.ctx.is_assignable(target, actual) {
            let from = m.ctx.class(actual).name.clone();
            let to = m.ctx.class(target).name.clone();
            return Err(throw_class_cast(m.ctx, m.thread, &from, &to));
        }
    }
    m.advance(2);
    Ok(())
}

pub(crate) fn op_instance_of(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_b(word));
    let unit = m.stack.current().unit;
    let target = resolver::resolve_class(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let result = !handle.is_null()
        && m.ctx
            .heap
            .class_of(handle)
            .is_some_and(|actual| m.ctx.is_assignable(target, actual));
    m.stack.set_reg(inst_a(word), result as u32);
    m.advance(2);
    Ok(())
}

pub(crate) fn op_array_length(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_b(word));
    let obj = m.obj_or_npe(handle, "array-length")?;
    let len = obj.array_len().expect("array-length on non-array");
    m.stack.set_reg(inst_a(word), len as u32);
    m.advance(1);
    Ok(())
}

pub(crate) fn op_new_instance(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let unit = m.stack.current().unit;
    let class_id = resolver::resolve_class(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let class = m.ctx.class(class_id);
    if class.is_interface() || class.access_flags & flags::ACC_ABSTRACT != 0 {
        return Err(throw(
            m.ctx,
            m.thread,
            m.ctx.well_known().instantiation,
            &class.name,
        ));
    }
    resolver::ensure_initialized(m.ctx, m.thread, class_id)?;
    let Some(handle) = m.ctx.heap.alloc_instance(class_id, class.instance_slots) else {
        return Err(throw_out_of_memory(m.ctx, m.thread));
    };
    // Pin across the register store, mirroring the allocator contract
    m.thread.tracked.track(handle);
    m.stack.set_reg(inst_aa(word), handle.raw());
    m.thread.tracked.release(handle);
    m.advance(2);
    Ok(())
}

pub(crate) fn op_new_array(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let len = m.stack.reg(inst_b(word)) as i32;
    if len < 0 {
        return Err(throw(
            m.ctx,
            m.thread,
            m.ctx.well_known().negative_array_size,
            &len.to_string(),
        ));
    }
    let unit = m.stack.current().unit;
    let class_id = resolver::resolve_class(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let elem = resolver::element_type(&m.ctx.class(class_id).name);
    let Some(handle) = m.ctx.heap.alloc_array(class_id, elem, len as usize) else {
        return Err(throw_out_of_memory(m.ctx, m.thread));
    };
    m.stack.set_reg(inst_a(word), handle.raw());
    m.advance(2);
    Ok(())
}

pub(crate) fn op_fill_array_data(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_aa(word));
    let obj = m.obj_or_npe(handle, "fill-array-data")?;
    let table_off = words_i32(m.word(1), m.word(2));

    let frame = m.stack.current();
    let table_pc = (frame.pc as i64 + table_off as i64) as usize;
    let insns = &frame.body.insns;
    debug_assert_eq!(insns[table_pc] >> 8, op::FILL_ARRAY_DATA_PAYLOAD as u16);
    let elem_width = insns[table_pc + 1] as usize;
    let count = (insns[table_pc + 2] as usize) | ((insns[table_pc + 3] as usize) << 16);
    let data = &insns[table_pc + 4..];

    let ObjectBody::Array(array) = &obj.body else {
        panic!("fill-array-data on non-array");
    };
    let mut array = array.lock();
    if count > array.len() {
        let len = array.len();
        drop(array);
        return Err(throw_array_bounds(m.ctx, m.thread, count as i32, len));
    }
    let byte_at = |i: usize| -> u8 {
        let w = data[i / 2];
        if i % 2 == 0 {
            (w & 0xff) as u8
        } else {
            (w >> 8) as u8
        }
    };
    let word32 = |i: usize| -> u32 {
        (byte_at(i) as u32)
            | ((byte_at(i + 1) as u32) << 8)
            | ((byte_at(i + 2) as u32) << 16)
            | ((byte_at(i + 3) as u32) << 24)
    };
    for i in 0..count {
        let off = i * elem_width;
        match &mut *array {
            ArrayData::Boolean(v) => v[i] = byte_at(off),
            ArrayData::Byte(v) => v[i] = byte_at(off) as i8,
            ArrayData::Char(v) => v[i] = byte_at(off) as u16 | ((byte_at(off + 1) as u16) << 8),
            ArrayData::Short(v) => {
                v[i] = (byte_at(off) as u16 | ((byte_at(off + 1) as u16) << 8)) as i16
            }
            ArrayData::Int(v) => v[i] = word32(off) as i32,
            ArrayData::Float(v) => v[i] = f32::from_bits(word32(off)),
            ArrayData::Long(v) => {
                v[i] = ((word32(off) as u64) | ((word32(off + 4) as u64) << 32)) as i64
            }
            ArrayData::Double(v) => {
                v[i] = f64::from_bits((word32(off) as u64) | ((word32(off + 4) as u64) << 32))
            }
            ArrayData::Object(_) => panic!("fill-array-data on reference array"),
        }
    }
    drop(array);
    m.advance(3);
    Ok(())
}

pub(crate) fn op_throw(m: &mut Machine, _opcode: u8, word: u16) -> ExecResult<()> {
    let handle = m.stack.reg_obj(inst_aa(word));
    if handle.is_null() {
        return Err(throw_null_pointer(m.ctx, m.thread, "throw of null"));
    }
    m.thread.set_pending(handle);
    Err(ExceptionRaised)
}

pub(crate) fn op_goto(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let offset = match opcode {
        op::OP_GOTO => inst_aa_signed(word),
        op::OP_GOTO_16 => m.word(1) as i16 as i32,
        _ => words_i32(m.word(1), m.word(2)),
    };
    m.branch(offset);
    Ok(())
}

pub(crate) fn op_switch(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let value = m.stack.reg(inst_aa(word)) as i32;
    let table_off = words_i32(m.word(1), m.word(2));
    let frame = m.stack.current();
    let table_pc = (frame.pc as i64 + table_off as i64) as usize;
    let insns = &frame.body.insns;

    let target = if opcode == op::OP_PACKED_SWITCH {
        debug_assert_eq!(insns[table_pc] >> 8, op::PACKED_SWITCH_PAYLOAD as u16);
        let size = insns[table_pc + 1] as usize;
        let first_key = words_i32(insns[table_pc + 2], insns[table_pc + 3]);
        let index = (value as i64 - first_key as i64) as usize;
        if (value as i64) < first_key as i64 || index >= size {
            None
        } else {
            let at = table_pc + 4 + index * 2;
            Some(words_i32(insns[at], insns[at + 1]))
        }
    } else {
        debug_assert_eq!(insns[table_pc] >> 8, op::SPARSE_SWITCH_PAYLOAD as u16);
        let size = insns[table_pc + 1] as usize;
        let keys = &insns[table_pc + 2..table_pc + 2 + size * 2];
        let targets = &insns[table_pc + 2 + size * 2..];
        (0..size)
            .find(|&i| words_i32(keys[i * 2], keys[i * 2 + 1]) == value)
            .map(|i| words_i32(targets[i * 2], targets[i * 2 + 1]))
    };

    match target {
        Some(offset) => m.branch(offset),
        None => m.advance(3),
    }
    Ok(())
}

pub(crate) fn op_cmp(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let (bb, cc) = byte_pair(m.word(1));
    let result = match opcode {
        op::OP_CMPL_FLOAT | op::OP_CMPG_FLOAT => {
            let a = f32::from_bits(m.stack.reg(bb));
            let b = f32::from_bits(m.stack.reg(cc));
            fp_compare(a, b, if opcode == op::OP_CMPL_FLOAT { -1 } else { 1 })
        }
        op::OP_CMPL_DOUBLE | op::OP_CMPG_DOUBLE => {
            let a = f64::from_bits(m.stack.reg_wide(bb));
            let b = f64::from_bits(m.stack.reg_wide(cc));
            fp_compare(a, b, if opcode == op::OP_CMPL_DOUBLE { -1 } else { 1 })
        }
        _ => {
            let a = m.stack.reg_wide(bb) as i64;
            let b = m.stack.reg_wide(cc) as i64;
            match a.cmp(&b) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            }
        }
    };
    m.stack.set_reg(inst_aa(word), result as u32);
    m.advance(2);
    Ok(())
}

pub(crate) fn op_if(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let a = m.stack.reg(inst_a(word)) as i32;
    let b = m.stack.reg(inst_b(word)) as i32;
    let taken = match opcode {
        op::OP_IF_EQ => a == b,
        op::OP_IF_NE => a != b,
        op::OP_IF_LT => a < b,
        op::OP_IF_GE => a >= b,
        op::OP_IF_GT => a > b,
        _ => a <= b,
    };
    if taken {
        let offset = m.word(1) as i16 as i32;
        m.branch(offset);
    } else {
        m.advance(2);
    }
    Ok(())
}

pub(crate) fn op_ifz(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let a = m.stack.reg(inst_aa(word)) as i32;
    let taken = match opcode {
        op::OP_IF_EQZ => a == 0,
        op::OP_IF_NEZ => a != 0,
        op::OP_IF_LTZ => a < 0,
        op::OP_IF_GEZ => a >= 0,
        op::OP_IF_GTZ => a > 0,
        _ => a <= 0,
    };
    if taken {
        let offset = m.word(1) as i16 as i32;
        m.branch(offset);
    } else {
        m.advance(2);
    }
    Ok(())
}

pub(crate) fn op_invoke(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    m.do_invoke(opcode, word)
}

pub(crate) fn op_aget(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let (bb, cc) = byte_pair(m.word(1));
    let handle = m.stack.reg_obj(bb);
    let index = m.stack.reg(cc) as i32;
    let obj = m.obj_or_npe(handle, "array load")?;
    let ObjectBody::Array(array) = &obj.body else {
        panic!("aget on non-array");
    };
    let array = array.lock();
    if index < 0 || index as usize >= array.len() {
        let len = array.len();
        drop(array);
        return Err(throw_array_bounds(m.ctx, m.thread, index, len));
    }
    let i = index as usize;
    let dst = inst_aa(word);
    match (opcode, &*array) {
        (op::OP_AGET, ArrayData::Int(v)) => m.stack.set_reg(dst, v[i] as u32),
        (op::OP_AGET, ArrayData::Float(v)) => m.stack.set_reg(dst, v[i].to_bits()),
        (op::OP_AGET_WIDE, ArrayData::Long(v)) => m.stack.set_reg_wide(dst, v[i] as u64),
        (op::OP_AGET_WIDE, ArrayData::Double(v)) => m.stack.set_reg_wide(dst, v[i].to_bits()),
        (op::OP_AGET_OBJECT, ArrayData::Object(v)) => m.stack.set_reg(dst, v[i]),
        (op::OP_AGET_BOOLEAN, ArrayData::Boolean(v)) => m.stack.set_reg(dst, v[i] as u32),
        (op::OP_AGET_BYTE, ArrayData::Byte(v)) => m.stack.set_reg(dst, v[i] as i32 as u32),
        (op::OP_AGET_CHAR, ArrayData::Char(v)) => m.stack.set_reg(dst, v[i] as u32),
        (op::OP_AGET_SHORT, ArrayData::Short(v)) => m.stack.set_reg(dst, v[i] as i32 as u32),
        (_, data) => panic!("{} on {:?} array", insn_name(opcode), data.elem_width()),
    }
    m.advance(2);
    Ok(())
}

pub(crate) fn op_aput(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let (bb, cc) = byte_pair(m.word(1));
    let handle = m.stack.reg_obj(bb);
    let index = m.stack.reg(cc) as i32;
    let src = inst_aa(word);
    let obj = m.obj_or_npe(handle, "array store")?;

    // Reference stores are checked against the array's element class
    if opcode == op::OP_APUT_OBJECT {
        let value = m.stack.reg_obj(src);
        if !value.is_null() {
            let array_class = m.ctx.class(obj.class);
            if let Some(elem_name) = array_class
                .name
                .strip_prefix("[L")
                .and_then(|s| s.strip_suffix(';'))
            {
                let elem = m.ctx.find_class(elem_name).expect("array of unknown class");
                let actual = m.ctx.heap.class_of(value).expect("stale store operand");
                if !m.ctx.is_assignable(elem, actual) {
                    return Err(throw(
                        m.ctx,
                        m.thread,
                        m.ctx.well_known().array_store,
                        &format!("{} into {}", m.ctx.class(actual).name, array_class.name),
                    ));
                }
            }
        }
    }

    let ObjectBody::Array(array) = &obj.body else {
        panic!("aput on non-array");
    };
    let mut array = array.lock();
    if index < 0 || index as usize >= array.len() {
        let len = array.len();
        drop(array);
        return Err(throw_array_bounds(m.ctx, m.thread, index, len));
    }
    let i = index as usize;
    match (opcode, &mut *array) {
        (op::OP_APUT, ArrayData::Int(v)) => v[i] = m.stack.reg(src) as i32,
        (op::OP_APUT, ArrayData::Float(v)) => v[i] = f32::from_bits(m.stack.reg(src)),
        (op::OP_APUT_WIDE, ArrayData::Long(v)) => v[i] = m.stack.reg_wide(src) as i64,
        (op::OP_APUT_WIDE, ArrayData::Double(v)) => {
            v[i] = f64::from_bits(m.stack.reg_wide(src))
        }
        (op::OP_APUT_OBJECT, ArrayData::Object(v)) => v[i] = m.stack.reg(src),
        (op::OP_APUT_BOOLEAN, ArrayData::Boolean(v)) => v[i] = (m.stack.reg(src) & 1) as u8,
        (op::OP_APUT_BYTE, ArrayData::Byte(v)) => v[i] = m.stack.reg(src) as u8 as i8,
        (op::OP_APUT_CHAR, ArrayData::Char(v)) => v[i] = m.stack.reg(src) as u16,
        (op::OP_APUT_SHORT, ArrayData::Short(v)) => v[i] = m.stack.reg(src) as u16 as i16,
        (_, data) => panic!("{} on {:?} array", insn_name(opcode), data.elem_width()),
    }
    drop(array);
    m.advance(2);
    Ok(())
}

/// Normalize a field cell for an iget/sget variant: sub-int widths are
/// sign/zero-extended on the read side.
fn narrow_field_read(kind: u8, cell: u64) -> u32 {
    let raw = cell as u32;
    match kind {
        0 => raw,                       // 32-bit / reference
        1 => (raw as u8 & 1) as u32,    // boolean
        2 => raw as u8 as i8 as i32 as u32, // byte
        3 => raw as u16 as u32,         // char
        _ => raw as u16 as i16 as i32 as u32, // short
    }
}

fn field_kind(offset_from_family_base: u8) -> u8 {
    // families order: 32-bit, wide, object, boolean, byte, char, short
    match offset_from_family_base {
        3 => 1,
        4 => 2,
        5 => 3,
        6 => 4,
        _ => 0,
    }
}

pub(crate) fn op_iget(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let unit = m.stack.current().unit;
    let field = resolver::resolve_field(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let handle = m.stack.reg_obj(inst_b(word));
    let obj = m.obj_or_npe(handle, "field load on null")?;
    let cell = obj.read_field(field.slot, field.is_volatile());
    if field.is_volatile() {
        fence(Ordering::Acquire);
    }
    let dst = inst_a(word);
    if opcode == op::OP_IGET_WIDE {
        m.stack.set_reg_wide(dst, cell);
    } else {
        m.stack
            .set_reg(dst, narrow_field_read(field_kind(opcode - op::OP_IGET), cell));
    }
    m.advance(2);
    Ok(())
}

pub(crate) fn op_iput(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let unit = m.stack.current().unit;
    let field = resolver::resolve_field(m.ctx, m.thread, unit, m.word(1) as u32)?;
    let handle = m.stack.reg_obj(inst_b(word));
    let obj = m.obj_or_npe(handle, "field store on null")?;
    let src = inst_a(word);
    let cell = if opcode == op::OP_IPUT_WIDE {
        m.stack.reg_wide(src)
    } else {
        m.stack.reg(src) as u64
    };
    if field.is_volatile() {
        fence(Ordering::Release);
    }
    obj.write_field(field.slot, cell, field.is_volatile());
    m.advance(2);
    Ok(())
}

pub(crate) fn op_sget(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let unit = m.stack.current().unit;
    let field = resolver::resolve_field(m.ctx, m.thread, unit, m.word(1) as u32)?;
    resolver::ensure_initialized(m.ctx, m.thread, field.class)?;
    let class = m.ctx.class(field.class);
    let cell = class.read_static(field.slot, field.is_volatile());
    if field.is_volatile() {
        fence(Ordering::Acquire);
    }
    let dst = inst_aa(word);
    if opcode == op::OP_SGET_WIDE {
        m.stack.set_reg_wide(dst, cell);
    } else {
        m.stack
            .set_reg(dst, narrow_field_read(field_kind(opcode - op::OP_SGET), cell));
    }
    m.advance(2);
    Ok(())
}

pub(crate) fn op_sput(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let unit = m.stack.current().unit;
    let field = resolver::resolve_field(m.ctx, m.thread, unit, m.word(1) as u32)?;
    resolver::ensure_initialized(m.ctx, m.thread, field.class)?;
    let class = m.ctx.class(field.class);
    let src = inst_aa(word);
    let cell = if opcode == op::OP_SPUT_WIDE {
        m.stack.reg_wide(src)
    } else {
        m.stack.reg(src) as u64
    };
    if field.is_volatile() {
        fence(Ordering::Release);
    }
    class.write_static(field.slot, cell, field.is_volatile());
    m.advance(2);
    Ok(())
}

pub(crate) fn op_unop(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_a(word);
    let src = inst_b(word);
    match opcode {
        op::OP_NEG_INT => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, v.wrapping_neg() as u32);
        }
        op::OP_NOT_INT => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, !v as u32);
        }
        op::OP_NEG_LONG => {
            let v = m.stack.reg_wide(src) as i64;
            m.stack.set_reg_wide(dst, v.wrapping_neg() as u64);
        }
        op::OP_NOT_LONG => {
            let v = m.stack.reg_wide(src) as i64;
            m.stack.set_reg_wide(dst, !v as u64);
        }
        op::OP_NEG_FLOAT => {
            let v = f32::from_bits(m.stack.reg(src));
            m.stack.set_reg(dst, (-v).to_bits());
        }
        op::OP_NEG_DOUBLE => {
            let v = f64::from_bits(m.stack.reg_wide(src));
            m.stack.set_reg_wide(dst, (-v).to_bits());
        }
        op::OP_INT_TO_LONG => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg_wide(dst, v as i64 as u64);
        }
        op::OP_INT_TO_FLOAT => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, (v as f32).to_bits());
        }
        op::OP_INT_TO_DOUBLE => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg_wide(dst, (v as f64).to_bits());
        }
        op::OP_LONG_TO_INT => {
            let v = m.stack.reg_wide(src) as i64;
            m.stack.set_reg(dst, v as i32 as u32);
        }
        op::OP_LONG_TO_FLOAT => {
            let v = m.stack.reg_wide(src) as i64;
            m.stack.set_reg(dst, (v as f32).to_bits());
        }
        op::OP_LONG_TO_DOUBLE => {
            let v = m.stack.reg_wide(src) as i64;
            m.stack.set_reg_wide(dst, (v as f64).to_bits());
        }
        // Float-to-integral conversions truncate toward zero, take NaN
        // to 0 and saturate at the type bounds
        op::OP_FLOAT_TO_INT => {
            let v = f32::from_bits(m.stack.reg(src));
            m.stack.set_reg(dst, (v as i32) as u32);
        }
        op::OP_FLOAT_TO_LONG => {
            let v = f32::from_bits(m.stack.reg(src));
            m.stack.set_reg_wide(dst, (v as i64) as u64);
        }
        op::OP_FLOAT_TO_DOUBLE => {
            let v = f32::from_bits(m.stack.reg(src));
            m.stack.set_reg_wide(dst, (v as f64).to_bits());
        }
        op::OP_DOUBLE_TO_INT => {
            let v = f64::from_bits(m.stack.reg_wide(src));
            m.stack.set_reg(dst, (v as i32) as u32);
        }
        op::OP_DOUBLE_TO_LONG => {
            let v = f64::from_bits(m.stack.reg_wide(src));
            m.stack.set_reg_wide(dst, (v as i64) as u64);
        }
        op::OP_DOUBLE_TO_FLOAT => {
            let v = f64::from_bits(m.stack.reg_wide(src));
            m.stack.set_reg(dst, (v as f32).to_bits());
        }
        op::OP_INT_TO_BYTE => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, (v as i8 as i32) as u32);
        }
        op::OP_INT_TO_CHAR => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, (v as u16 as i32) as u32);
        }
        _ => {
            let v = m.stack.reg(src) as i32;
            m.stack.set_reg(dst, (v as i16 as i32) as u32);
        }
    }
    m.advance(1);
    Ok(())
}

/// Shared body of the three-register, two-address and literal binop
/// families. `index` is the operation's offset inside its family block
/// (add=0, sub=1, mul=2, div=3, rem=4, and=5, or=6, xor=7, shl=8,
/// shr=9, ushr=10, then the long and float/double blocks).
fn binop_int(m: &mut Machine, index: u8, a: i32, b: i32) -> ExecResult<i32> {
    Ok(match index {
        0 => a.wrapping_add(b),
        1 => a.wrapping_sub(b),
        2 => a.wrapping_mul(b),
        3 => m.div_i32(a, b)?,
        4 => m.rem_i32(a, b)?,
        5 => a & b,
        6 => a | b,
        7 => a ^ b,
        8 => a.wrapping_shl(b as u32 & 0x1f),
        9 => a.wrapping_shr(b as u32 & 0x1f),
        _ => ((a as u32) >> (b as u32 & 0x1f)) as i32,
    })
}

fn binop_long(m: &mut Machine, index: u8, a: i64, b: i64) -> ExecResult<i64> {
    Ok(match index {
        0 => a.wrapping_add(b),
        1 => a.wrapping_sub(b),
        2 => a.wrapping_mul(b),
        3 => m.div_i64(a, b)?,
        4 => m.rem_i64(a, b)?,
        5 => a & b,
        6 => a | b,
        7 => a ^ b,
        8 => a.wrapping_shl(b as u32 & 0x3f),
        9 => a.wrapping_shr(b as u32 & 0x3f),
        _ => ((a as u64) >> (b as u32 & 0x3f)) as i64,
    })
}

fn binop_float(index: u8, a: f32, b: f32) -> f32 {
    match index {
        0 => a + b,
        1 => a - b,
        2 => a * b,
        3 => a / b,
        _ => a % b,
    }
}

fn binop_double(index: u8, a: f64, b: f64) -> f64 {
    match index {
        0 => a + b,
        1 => a - b,
        2 => a * b,
        3 => a / b,
        _ => a % b,
    }
}

/// The 23x binop block (0x90..=0xaf): `vAA = vBB op vCC`.
pub(crate) fn op_binop(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_aa(word);
    let (bb, cc) = byte_pair(m.word(1));
    let index = opcode - op::OP_ADD_INT;
    match index {
        0..=10 => {
            let a = m.stack.reg(bb) as i32;
            let b = m.stack.reg(cc) as i32;
            let r = binop_int(m, index, a, b)?;
            m.stack.set_reg(dst, r as u32);
        }
        11..=21 => {
            let a = m.stack.reg_wide(bb) as i64;
            let b = m.stack.reg_wide(cc) as i64;
            let r = binop_long(m, index - 11, a, b)?;
            m.stack.set_reg_wide(dst, r as u64);
        }
        22..=26 => {
            let a = f32::from_bits(m.stack.reg(bb));
            let b = f32::from_bits(m.stack.reg(cc));
            m.stack.set_reg(dst, binop_float(index - 22, a, b).to_bits());
        }
        _ => {
            let a = f64::from_bits(m.stack.reg_wide(bb));
            let b = f64::from_bits(m.stack.reg_wide(cc));
            m.stack
                .set_reg_wide(dst, binop_double(index - 27, a, b).to_bits());
        }
    }
    m.advance(2);
    Ok(())
}

/// The 12x two-address block (0xb0..=0xcf): `vA = vA op vB`.
pub(crate) fn op_binop_2addr(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_a(word);
    let src = inst_b(word);
    let index = opcode - op::OP_ADD_INT_2ADDR;
    match index {
        0..=10 => {
            let a = m.stack.reg(dst) as i32;
            let b = m.stack.reg(src) as i32;
            let r = binop_int(m, index, a, b)?;
            m.stack.set_reg(dst, r as u32);
        }
        11..=21 => {
            let a = m.stack.reg_wide(dst) as i64;
            let b = m.stack.reg_wide(src) as i64;
            let r = binop_long(m, index - 11, a, b)?;
            m.stack.set_reg_wide(dst, r as u64);
        }
        22..=26 => {
            let a = f32::from_bits(m.stack.reg(dst));
            let b = f32::from_bits(m.stack.reg(src));
            m.stack.set_reg(dst, binop_float(index - 22, a, b).to_bits());
        }
        _ => {
            let a = f64::from_bits(m.stack.reg_wide(dst));
            let b = f64::from_bits(m.stack.reg_wide(src));
            m.stack
                .set_reg_wide(dst, binop_double(index - 27, a, b).to_bits());
        }
    }
    m.advance(1);
    Ok(())
}

/// The 22s literal block (0xd0..=0xd7): `vA = vB op #lit16` (rsub
/// reverses the operands).
pub(crate) fn op_binop_lit16(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_a(word);
    let b = m.stack.reg(inst_b(word)) as i32;
    let lit = m.word(1) as i16 as i32;
    let r = match opcode {
        op::OP_ADD_INT_LIT16 => b.wrapping_add(lit),
        op::OP_RSUB_INT => lit.wrapping_sub(b),
        op::OP_MUL_INT_LIT16 => b.wrapping_mul(lit),
        op::OP_DIV_INT_LIT16 => m.div_i32(b, lit)?,
        op::OP_REM_INT_LIT16 => m.rem_i32(b, lit)?,
        op::OP_AND_INT_LIT16 => b & lit,
        op::OP_OR_INT_LIT16 => b | lit,
        _ => b ^ lit,
    };
    m.stack.set_reg(dst, r as u32);
    m.advance(2);
    Ok(())
}

/// The 22b literal block (0xd8..=0xe2): `vAA = vBB op #lit8`.
pub(crate) fn op_binop_lit8(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    let dst = inst_aa(word);
    let ext = m.word(1);
    let b = m.stack.reg(byte_pair(ext).0) as i32;
    let lit = high_byte_signed(ext);
    let r = match opcode {
        op::OP_ADD_INT_LIT8 => b.wrapping_add(lit),
        op::OP_RSUB_INT_LIT8 => lit.wrapping_sub(b),
        op::OP_MUL_INT_LIT8 => b.wrapping_mul(lit),
        op::OP_DIV_INT_LIT8 => m.div_i32(b, lit)?,
        op::OP_REM_INT_LIT8 => m.rem_i32(b, lit)?,
        op::OP_AND_INT_LIT8 => b & lit,
        op::OP_OR_INT_LIT8 => b | lit,
        op::OP_XOR_INT_LIT8 => b ^ lit,
        op::OP_SHL_INT_LIT8 => b.wrapping_shl(lit as u32 & 0x1f),
        op::OP_SHR_INT_LIT8 => b.wrapping_shr(lit as u32 & 0x1f),
        _ => ((b as u32) >> (lit as u32 & 0x1f)) as i32,
    };
    m.stack.set_reg(dst, r as u32);
    m.advance(2);
    Ok(())
}
