//! Unit linking
//!
//! Turns a unit's pre-link `ClassItem`s into registered runtime
//! classes: assigns field slots (superclass block first), builds the
//! vtable (override by name+shorty, append otherwise), sizes static
//! storage, and finds `<clinit>`. Classes must appear after the classes
//! they extend; built-ins are always available.

use std::sync::{Arc, OnceLock};

use class_model::{flags, ClassDef, ClassItem, FieldDef, InitState, MethodDef};
use core_types::{ClassId, MethodId, PrimitiveType, UnitId, VmError};
use runtime_core::RuntimeContext;

/// Link every class of a loaded unit into the context registries.
pub fn link_unit(ctx: &RuntimeContext, unit_id: UnitId) -> Result<Vec<ClassId>, VmError> {
    let (unit, _cache) = ctx.unit(unit_id);
    let _guard = ctx.linker_guard();
    let mut linked = Vec::new();
    for item in &unit.classes {
        linked.push(link_class(ctx, unit_id, &unit, item)?);
    }
    Ok(linked)
}

fn link_class(
    ctx: &RuntimeContext,
    unit_id: UnitId,
    unit: &class_model::CodeUnit,
    item: &ClassItem,
) -> Result<ClassId, VmError> {
    let name = unit.type_name(item.name).clone();
    if ctx.find_class(&name).is_some() {
        return Err(VmError::InvalidUnit(format!("duplicate class {name}")));
    }

    let superclass = match item.superclass {
        Some(idx) => {
            let super_name = unit.type_name(idx);
            Some(ctx.find_class(super_name).ok_or_else(|| {
                VmError::InvalidUnit(format!("{name}: unknown superclass {super_name}"))
            })?)
        }
        None => None,
    };
    let mut interfaces = Vec::new();
    for &idx in &item.interfaces {
        let iface_name = unit.type_name(idx);
        interfaces.push(ctx.find_class(iface_name).ok_or_else(|| {
            VmError::InvalidUnit(format!("{name}: unknown interface {iface_name}"))
        })?);
    }

    let id = ctx.reserve_class_id();
    let super_def = superclass.map(|s| ctx.class(s));

    // Instance fields extend the superclass's slot block
    let base_slots = super_def.as_ref().map_or(0, |s| s.instance_slots);
    let mut instance_fields = Vec::new();
    for (i, field) in item.instance_fields.iter().enumerate() {
        let def = register_field(ctx, unit, id, field, base_slots + i as u32);
        instance_fields.push(def);
    }

    let mut static_fields = Vec::new();
    for (i, field) in item.static_fields.iter().enumerate() {
        let def = register_field(ctx, unit, id, field, i as u32);
        static_fields.push(def);
    }

    // Vtable: superclass slots first, overrides in place, new virtual
    // methods appended
    let mut vtable: Vec<MethodId> = super_def.as_ref().map_or_else(Vec::new, |s| s.vtable.clone());
    let mut methods = Vec::new();
    let mut clinit = None;
    for m in &item.methods {
        let method_name = unit.string(m.name).clone();
        let shorty = unit.shorty(m.proto).clone();
        let is_direct = m.access_flags & (flags::ACC_STATIC | flags::ACC_PRIVATE) != 0
            || method_name.starts_with('<');
        let vtable_index = if is_direct {
            None
        } else {
            let slot = vtable.iter().position(|&mid| {
                let existing = ctx.method(mid);
                existing.name == method_name && existing.shorty == shorty
            });
            Some(slot.unwrap_or(vtable.len()) as u16)
        };

        let def = ctx.register_method(|mid| MethodDef {
            id: mid,
            class: id,
            name: method_name.clone(),
            shorty: shorty.clone(),
            access_flags: m.access_flags,
            vtable_index,
            unit: Some(unit_id),
            body: m.body.clone(),
            arg_info: Default::default(),
        });

        if let Some(slot) = vtable_index {
            let slot = slot as usize;
            if slot == vtable.len() {
                vtable.push(def.id);
            } else {
                vtable[slot] = def.id;
            }
        }
        if &*method_name == "<clinit>" {
            clinit = Some(def.id);
        }
        methods.push(def.id);
    }

    let statics = (0..static_fields.len())
        .map(|_| Default::default())
        .collect();
    let class = Arc::new(ClassDef {
        id,
        name: name.clone(),
        unit: Some(unit_id),
        superclass,
        interfaces,
        access_flags: item.access_flags,
        instance_slots: base_slots + instance_fields.len() as u32,
        instance_fields: instance_fields.iter().map(|f| f.id).collect(),
        static_fields: static_fields.iter().map(|f| f.id).collect(),
        methods,
        vtable,
        statics,
        clinit,
        init: InitState::new(),
        class_obj: OnceLock::new(),
    });
    ctx.register_class(class);
    log::debug!("linked class {name} as {:?}", id);
    Ok(id)
}

fn register_field(
    ctx: &RuntimeContext,
    unit: &class_model::CodeUnit,
    class: ClassId,
    item: &class_model::FieldItem,
    slot: u32,
) -> Arc<FieldDef> {
    let type_name = unit.type_name(item.type_name);
    let ptype = single_char_primitive(type_name);
    ctx.register_field(|fid| FieldDef {
        id: fid,
        class,
        name: unit.string(item.name).clone(),
        ptype,
        access_flags: item.access_flags,
        slot,
    })
}

/// Primitive type of a field type name, or None for references.
fn single_char_primitive(name: &str) -> Option<PrimitiveType> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PrimitiveType::from_shorty(c),
        _ => None,
    }
}
