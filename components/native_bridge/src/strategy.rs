//! Call strategies
//!
//! The interpreter calls [`invoke_native`] for every native-method
//! dispatch; the strategy decides how the signature is consulted.
//! [`GenericCall`] walks the shorty every time and works for any
//! signature. [`HintedCall`] computes an [`ArgInfo`] word once per
//! method, caches it on the `MethodDef`, and drives the unpack loop
//! from the cached layout; signatures the word cannot encode fall back
//! to the generic scan. Both must be bit-identical in effect.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use class_model::MethodDef;
use core_types::{ExecResult, JValue, ObjRef};
use runtime_core::exception::{throw, throw_null_pointer};
use runtime_core::{RuntimeContext, ThreadStatus, VmThread};

use crate::hints::{return_kind_of, ArgInfo, ReturnKind};
use crate::marshal::{unpack_args, widen_return};

/// One way of turning a register window into native arguments.
pub trait CallStrategy: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Unpack the declared arguments (receiver excluded) and determine
    /// the return kind. None on a window/signature mismatch, which is
    /// fatal (verified code cannot produce it).
    fn unpack(&self, method: &MethodDef, decl_slots: &[u32]) -> Option<(Vec<JValue>, ReturnKind)>;
}

/// Portable strategy: full signature scan per call.
#[derive(Debug, Default)]
pub struct GenericCall;

impl CallStrategy for GenericCall {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn unpack(&self, method: &MethodDef, decl_slots: &[u32]) -> Option<(Vec<JValue>, ReturnKind)> {
        let args = unpack_args(&method.shorty, decl_slots)?;
        Some((args, return_kind_of(method.return_char())))
    }
}

/// Hint-precomputation strategy: one signature scan per method, then
/// layout-driven unpacking.
#[derive(Debug, Default)]
pub struct HintedCall;

impl HintedCall {
    fn hint_for(&self, method: &MethodDef) -> ArgInfo {
        let raw = method.arg_info.load(Ordering::Acquire);
        if raw != 0 {
            return ArgInfo(raw);
        }
        let hint = ArgInfo::compute(&method.shorty, method.is_static());
        // Racing computations produce the same word; last writer wins
        method.arg_info.store(hint.raw(), Ordering::Release);
        hint
    }
}

impl CallStrategy for HintedCall {
    fn name(&self) -> &'static str {
        "hinted"
    }

    fn unpack(&self, method: &MethodDef, decl_slots: &[u32]) -> Option<(Vec<JValue>, ReturnKind)> {
        let hint = self.hint_for(method);
        if hint.force_slow() {
            log::trace!("{}: oversized signature, generic fallback", method.name);
            let args = unpack_args(&method.shorty, decl_slots)?;
            return Some((args, hint.return_kind()));
        }

        let receiver_slots = u32::from(!method.is_static());
        if receiver_slots + decl_slots.len() as u32 != hint.arg_slots() {
            return None;
        }

        // Widths come from the cached bitmap; the shorty is consulted
        // only for the value kind
        let bytes = method.shorty.as_bytes();
        let mut args = Vec::with_capacity(bytes.len() - 1);
        let mut slot = receiver_slots;
        let mut window = 0usize;
        for &c in &bytes[1..] {
            if hint.wide_starts_at(slot) {
                let low = *decl_slots.get(window)?;
                let high = *decl_slots.get(window + 1)?;
                let raw = core_types::value::wide_from_words(low, high);
                args.push(if c == b'J' {
                    JValue::Long(raw as i64)
                } else {
                    JValue::Double(f64::from_bits(raw))
                });
                slot += 2;
                window += 2;
            } else {
                let raw = *decl_slots.get(window)?;
                args.push(match c {
                    b'L' => JValue::Object(ObjRef::from_raw(raw)),
                    b'F' => JValue::Float(f32::from_bits(raw)),
                    _ => JValue::Int(raw as i32),
                });
                slot += 1;
                window += 1;
            }
        }
        Some((args, hint.return_kind()))
    }
}

/// Dispatch a native method: look up the registered implementation,
/// insert the implicit environment and receiver/class arguments,
/// marshal the register window, pin reference arguments for the call's
/// duration, and normalize the result slot.
pub fn invoke_native(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    method: &Arc<MethodDef>,
    arg_regs: &[u32],
    strategy: &dyn CallStrategy,
) -> ExecResult<JValue> {
    let class = ctx.class(method.class);
    let Some(func) = ctx.find_native(&class.name, &method.name, &method.shorty) else {
        return Err(throw(
            ctx,
            thread,
            ctx.well_known().linkage,
            &format!("no native implementation for {}.{}", class.name, method.name),
        ));
    };

    let (recv, decl_slots) = if method.is_static() {
        let class_obj = resolver::class_object(ctx, thread, method.class)?;
        (JValue::Object(class_obj), arg_regs)
    } else {
        let recv = ObjRef::from_raw(arg_regs[0]);
        if recv.is_null() {
            return Err(throw_null_pointer(ctx, thread, &method.name));
        }
        (JValue::Object(recv), &arg_regs[1..])
    };

    let Some((args, ret_kind)) = strategy.unpack(method, decl_slots) else {
        panic!(
            "register window does not match signature {} of {}.{}",
            method.shorty, class.name, method.name
        );
    };

    // Pin the receiver and every reference argument for the call
    let pin_base = thread.local_refs.len();
    if let JValue::Object(r) = recv {
        thread.local_refs.add(r);
    }
    for a in &args {
        if let JValue::Object(r) = a {
            if !r.is_null() {
                thread.local_refs.add(*r);
            }
        }
    }

    log::trace!(
        "native call {}.{}:{} via {} strategy",
        class.name,
        method.name,
        method.shorty,
        strategy.name()
    );
    // Native code runs without the shared mutator hold: a blocking
    // native call must not stall a suspend-all request
    let released_hold = thread.holds_mutator;
    if released_hold {
        thread.holds_mutator = false;
        ctx.threads.mutator.unlock_shared();
    }
    thread.control.set_status(ThreadStatus::Native);
    let result = func(ctx, thread, recv, &args);
    thread.control.set_status(ThreadStatus::Running);
    if released_hold {
        ctx.threads.mutator.lock_shared();
        thread.holds_mutator = true;
    }
    thread.local_refs.truncate(pin_base);

    result.map(|v| widen_return(ret_kind, v))
}
