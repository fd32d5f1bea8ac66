//! Pending-exception helpers
//!
//! Raising an exception means allocating the instance, storing its
//! detail message, and parking it in the thread's pending slot. The
//! helpers return the `ExceptionRaised` marker so call sites read as
//! `return Err(throw_null_pointer(ctx, thread, ...))`.

use core_types::{ClassId, ExceptionRaised, ObjRef};

use crate::context::RuntimeContext;
use crate::thread::VmThread;

/// Slot of `core/Throwable.message` in every throwable instance.
pub const MESSAGE_SLOT: u32 = 0;

/// Raise an instance of `class` with a detail message.
pub fn throw(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    class: ClassId,
    msg: &str,
) -> ExceptionRaised {
    let def = ctx.class(class);
    let Some(obj) = ctx.heap.alloc_instance(class, def.instance_slots) else {
        // Allocation of the exception itself failed: fall back to the
        // preallocated out-of-memory instance
        thread.set_pending(ctx.preallocated_oom());
        return ExceptionRaised;
    };
    if let Some(text) = ctx
        .heap
        .alloc_string(ctx.well_known().string, msg.into())
    {
        if let Some(o) = ctx.heap.get(obj) {
            o.write_field(MESSAGE_SLOT, text.raw() as u64, false);
        }
    }
    log::debug!("throwing {}: {}", def.name, msg);
    thread.set_pending(obj);
    ExceptionRaised
}

/// Raise a null-pointer fault.
pub fn throw_null_pointer(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    what: &str,
) -> ExceptionRaised {
    throw(ctx, thread, ctx.well_known().null_pointer, what)
}

/// Raise an arithmetic fault (zero divisor).
pub fn throw_arithmetic(ctx: &RuntimeContext, thread: &mut VmThread) -> ExceptionRaised {
    throw(ctx, thread, ctx.well_known().arithmetic, "divide by zero")
}

/// Raise an array-bounds fault.
pub fn throw_array_bounds(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    index: i32,
    length: usize,
) -> ExceptionRaised {
    throw(
        ctx,
        thread,
        ctx.well_known().array_bounds,
        &format!("index={index} length={length}"),
    )
}

/// Raise a bad-cast fault.
pub fn throw_class_cast(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    from: &str,
    to: &str,
) -> ExceptionRaised {
    throw(
        ctx,
        thread,
        ctx.well_known().class_cast,
        &format!("{from} cannot be cast to {to}"),
    )
}

/// Raise an out-of-memory error; uses the preallocated instance when
/// even the error object cannot be allocated.
pub fn throw_out_of_memory(ctx: &RuntimeContext, thread: &mut VmThread) -> ExceptionRaised {
    throw(ctx, thread, ctx.well_known().out_of_memory, "allocation failed")
}

/// Raise a stack-overflow error.
pub fn throw_stack_overflow(ctx: &RuntimeContext, thread: &mut VmThread) -> ExceptionRaised {
    throw(
        ctx,
        thread,
        ctx.well_known().stack_overflow,
        "frame region exhausted",
    )
}

/// Class name and message of an exception object, for uncaught-
/// exception reports and tests.
pub fn describe(ctx: &RuntimeContext, obj: ObjRef) -> String {
    let Some(o) = ctx.heap.get(obj) else {
        return "<stale exception>".to_string();
    };
    let name = ctx.class(o.class).name.clone();
    let msg_handle = ObjRef::from_raw(o.read_field(MESSAGE_SLOT, false) as u32);
    match ctx.heap.get(msg_handle).and_then(|m| m.as_str().cloned()) {
        Some(text) => format!("{name}: {text}"),
        None => name.to_string(),
    }
}
