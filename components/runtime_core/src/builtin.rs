//! Built-in class registration
//!
//! The core classes the runtime itself depends on: the root object,
//! strings, class objects, and the throwable hierarchy the error paths
//! raise. Registered eagerly at bootstrap, already initialized (they
//! have no static initializers).

use std::sync::{Arc, OnceLock};

use class_model::{flags, ClassDef, FieldDef, InitState};
use core_types::ClassId;

use crate::context::{RuntimeContext, WellKnown};

fn register(
    ctx: &RuntimeContext,
    name: &str,
    superclass: Option<ClassId>,
    message_field: bool,
) -> ClassId {
    let id = ctx.reserve_class_id();
    let mut instance_fields = Vec::new();
    // Only Throwable declares a field; subclasses inherit its slot
    if message_field {
        let field = ctx.register_field(|fid| FieldDef {
            id: fid,
            class: id,
            name: Arc::from("message"),
            ptype: None,
            access_flags: flags::ACC_PUBLIC,
            slot: 0,
        });
        instance_fields.push(field.id);
    }
    let instance_slots = superclass
        .map(|sup| ctx.class(sup).instance_slots)
        .unwrap_or(0)
        + instance_fields.len() as u32;

    let class = ClassDef {
        id,
        name: Arc::from(name),
        unit: None,
        superclass,
        interfaces: Vec::new(),
        access_flags: flags::ACC_PUBLIC,
        instance_slots,
        instance_fields,
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
    id
}

/// Register every built-in class, returning the well-known ids.
pub fn register_builtins(ctx: &RuntimeContext) -> WellKnown {
    let object = register(ctx, "core/Object", None, false);
    let string = register(ctx, "core/String", Some(object), false);
    let class = register(ctx, "core/Class", Some(object), false);

    let throwable = register(ctx, "core/Throwable", Some(object), true);
    let exception = register(ctx, "core/Exception", Some(throwable), false);
    let runtime_exc = register(ctx, "core/RuntimeException", Some(exception), false);
    let error = register(ctx, "core/Error", Some(throwable), false);
    let linkage = register(ctx, "core/LinkageError", Some(error), false);

    WellKnown {
        object,
        string,
        class,
        throwable,
        null_pointer: register(ctx, "core/NullPointerException", Some(runtime_exc), false),
        arithmetic: register(ctx, "core/ArithmeticException", Some(runtime_exc), false),
        array_bounds: register(
            ctx,
            "core/ArrayIndexOutOfBoundsException",
            Some(runtime_exc),
            false,
        ),
        array_store: register(ctx, "core/ArrayStoreException", Some(runtime_exc), false),
        negative_array_size: register(
            ctx,
            "core/NegativeArraySizeException",
            Some(runtime_exc),
            false,
        ),
        class_cast: register(ctx, "core/ClassCastException", Some(runtime_exc), false),
        class_not_found: register(ctx, "core/ClassNotFoundException", Some(exception), false),
        no_such_method: register(ctx, "core/NoSuchMethodError", Some(linkage), false),
        no_such_field: register(ctx, "core/NoSuchFieldError", Some(linkage), false),
        linkage,
        instantiation: register(ctx, "core/InstantiationError", Some(linkage), false),
        illegal_monitor_state: register(
            ctx,
            "core/IllegalMonitorStateException",
            Some(runtime_exc),
            false,
        ),
        out_of_memory: register(ctx, "core/OutOfMemoryError", Some(error), false),
        stack_overflow: register(ctx, "core/StackOverflowError", Some(error), false),
        initializer_error: register(ctx, "core/InitializerError", Some(linkage), false),
    }
}
