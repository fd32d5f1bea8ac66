//! The resolution protocol
//!
//! `resolve_*(ctx, thread, unit, index)`: a cache hit returns without
//! taking any lock; a miss performs the symbolic lookup, stores the
//! result into the unit's cache slot (idempotent, last writer wins) and
//! returns it. Failures allocate the kind's exception, park it in the
//! thread's pending slot and surface as `Err(ExceptionRaised)` so the
//! dispatch loop can branch straight to its exception path.

use std::sync::Arc;

use class_model::{FieldDef, MethodDef};
use core_types::{ClassId, ExecResult, ExceptionRaised, ObjRef, UnitId};
use runtime_core::exception::throw;
use runtime_core::{exception, RuntimeContext, VmThread};

use crate::arrays;

/// Resolve a string-pool index to an interned string handle.
pub fn resolve_string(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    unit_id: UnitId,
    idx: u32,
) -> ExecResult<ObjRef> {
    let (unit, cache) = ctx.unit(unit_id);
    if let Some(handle) = cache.resolved_string(idx) {
        return Ok(handle);
    }
    let text = unit.string(idx);
    let Some(handle) = ctx.intern(text) else {
        return Err(exception::throw_out_of_memory(ctx, thread));
    };
    cache.put_string(idx, handle);
    Ok(handle)
}

/// Resolve a type-pool index to a loaded class.
///
/// Does not initialize the class; initialization is deferred to the
/// first instantiation, static access or static call.
pub fn resolve_class(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    unit_id: UnitId,
    type_idx: u32,
) -> ExecResult<ClassId> {
    let (unit, cache) = ctx.unit(unit_id);
    if let Some(id) = cache.resolved_class(type_idx) {
        return Ok(id);
    }
    let name = unit.type_name(type_idx);
    let id = match ctx.find_class(name) {
        Some(id) => id,
        None if name.starts_with('[') => arrays::array_class_for(ctx, thread, name)?,
        None => {
            return Err(throw(
                ctx,
                thread,
                ctx.well_known().class_not_found,
                name,
            ));
        }
    };
    cache.put_class(type_idx, id);
    Ok(id)
}

/// Resolve a method-ref index to a linked method.
pub fn resolve_method(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    unit_id: UnitId,
    method_idx: u32,
) -> ExecResult<Arc<MethodDef>> {
    let (unit, cache) = ctx.unit(unit_id);
    if let Some(id) = cache.resolved_method(method_idx) {
        return Ok(ctx.method(id));
    }
    let mref = unit.method_refs[method_idx as usize];
    let owner = resolve_class(ctx, thread, unit_id, mref.owner)?;
    let name = unit.string(mref.name);
    let shorty = unit.shorty(mref.proto);

    let Some(def) = find_method(ctx, owner, name, shorty) else {
        return Err(throw(
            ctx,
            thread,
            ctx.well_known().no_such_method,
            &format!("{}.{}:{}", unit.type_name(mref.owner), name, shorty),
        ));
    };
    cache.put_method(method_idx, def.id);
    Ok(def)
}

/// Search a class, its superclasses, then its interfaces for a method.
fn find_method(
    ctx: &RuntimeContext,
    class: ClassId,
    name: &str,
    shorty: &str,
) -> Option<Arc<MethodDef>> {
    let mut cursor = Some(class);
    while let Some(id) = cursor {
        let def = ctx.class(id);
        for &mid in &def.methods {
            let m = ctx.method(mid);
            if &*m.name == name && &*m.shorty == shorty {
                return Some(m);
            }
        }
        cursor = def.superclass;
    }
    // Interface methods are not on the superclass chain
    let mut cursor = Some(class);
    while let Some(id) = cursor {
        let def = ctx.class(id);
        for &iface in &def.interfaces {
            if let Some(m) = find_method(ctx, iface, name, shorty) {
                return Some(m);
            }
        }
        cursor = def.superclass;
    }
    None
}

/// Resolve a field-ref index to a linked field.
pub fn resolve_field(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    unit_id: UnitId,
    field_idx: u32,
) -> ExecResult<Arc<FieldDef>> {
    let (unit, cache) = ctx.unit(unit_id);
    if let Some(id) = cache.resolved_field(field_idx) {
        return Ok(ctx.field(id));
    }
    let fref = unit.field_refs[field_idx as usize];
    let owner = resolve_class(ctx, thread, unit_id, fref.owner)?;
    let name = unit.string(fref.name);

    let mut cursor = Some(owner);
    while let Some(id) = cursor {
        let def = ctx.class(id);
        for &fid in def.instance_fields.iter().chain(&def.static_fields) {
            let f = ctx.field(fid);
            if f.name == *name {
                cache.put_field(field_idx, f.id);
                return Ok(f);
            }
        }
        cursor = def.superclass;
    }
    Err(throw(
        ctx,
        thread,
        ctx.well_known().no_such_field,
        &format!("{}.{}", unit.type_name(fref.owner), name),
    ))
}

/// The class object backing `const-class` and static-call receivers,
/// allocated on first use.
pub fn class_object(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    class: ClassId,
) -> ExecResult<ObjRef> {
    let def = ctx.class(class);
    if let Some(&handle) = def.class_obj.get() {
        return Ok(handle);
    }
    let Some(handle) = ctx.heap.alloc_instance(ctx.well_known().class, 0) else {
        return Err(exception::throw_out_of_memory(ctx, thread));
    };
    // Racing allocators: first store wins, the loser's object is left
    // to the collector
    let _ = def.class_obj.set(handle);
    Ok(*def.class_obj.get().expect("class object just set"))
}
