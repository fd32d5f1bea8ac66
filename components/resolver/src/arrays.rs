//! On-demand array classes
//!
//! Array type names use the `[` prefix convention: `[I` is an int
//! array, `[Lcore/String;` an array of strings, `[[I` an array of int
//! arrays. Array classes are not declared in units; they are created
//! the first time a name is resolved.

use std::sync::{Arc, OnceLock};

use class_model::{flags, ClassDef, InitState};
use core_types::{ClassId, ExecResult, PrimitiveType};
use runtime_core::exception::throw;
use runtime_core::{RuntimeContext, VmThread};

/// Element type of an array class name: `Some` for primitive elements,
/// `None` for reference elements (including nested arrays).
pub fn element_type(name: &str) -> Option<PrimitiveType> {
    let elem = name.strip_prefix('[').unwrap_or(name);
    let mut chars = elem.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PrimitiveType::from_shorty(c),
        _ => None,
    }
}

/// Find or create the array class for `name` (which must start `[`).
pub fn array_class_for(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    name: &str,
) -> ExecResult<ClassId> {
    if let Some(id) = ctx.find_class(name) {
        return Ok(id);
    }
    if !valid_array_name(name) {
        return Err(throw(ctx, thread, ctx.well_known().class_not_found, name));
    }
    // Reference elements must name a loadable class
    if let Some(elem) = name.strip_prefix('[') {
        if let Some(class_name) = elem.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
            if ctx.find_class(class_name).is_none() {
                return Err(throw(
                    ctx,
                    thread,
                    ctx.well_known().class_not_found,
                    class_name,
                ));
            }
        } else if elem.starts_with('[') {
            array_class_for(ctx, thread, elem)?;
        }
    }

    let _guard = ctx.linker_guard();
    // Another thread may have won the race while we waited
    if let Some(id) = ctx.find_class(name) {
        return Ok(id);
    }
    let id = ctx.reserve_class_id();
    let class = ClassDef {
        id,
        name: Arc::from(name),
        unit: None,
        superclass: Some(ctx.well_known().object),
        interfaces: Vec::new(),
        access_flags: flags::ACC_PUBLIC | flags::ACC_FINAL,
        instance_slots: 0,
        instance_fields: Vec::new(),
        static_fields: Vec::new(),
        methods: Vec::new(),
        vtable: Vec::new(),
        statics: Box::new([]),
        clinit: None,
        init: InitState::new(),
        class_obj: OnceLock::new(),
    };
    class.init.mark_initialized();
    ctx.register_class(Arc::new(class));
    log::debug!("created array class {name}");
    Ok(id)
}

fn valid_array_name(name: &str) -> bool {
    let Some(elem) = name.strip_prefix('[') else {
        return false;
    };
    element_type(name).is_some()
        || elem.starts_with('[')
        || (elem.starts_with('L') && elem.ends_with(';'))
}
