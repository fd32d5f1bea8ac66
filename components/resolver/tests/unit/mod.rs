//! Unit tests for the resolution protocol

use std::sync::Arc;
use std::thread;

use class_model::builder::fmt10x;
use class_model::opcodes::OP_RETURN_VOID;
use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{RuntimeOptions, UnitId};
use resolver::{resolve_field, resolve_method, resolve_string};
use runtime_core::RuntimeContext;

fn fixture() -> (Arc<RuntimeContext>, UnitId) {
    let ctx = Arc::new(RuntimeContext::new(RuntimeOptions::default()).unwrap());
    let mut b = UnitBuilder::new();
    for i in 0..16 {
        b.intern(&format!("constant-{i}"));
    }
    b.method_ref("demo/Hot", "tick", "V");
    b.field_ref("demo/Hot", "beats", "I");
    b.add_class(
        ClassBuilder::new("demo/Hot", Some("core/Object"))
            .field("beats", "I", flags::ACC_PUBLIC)
            .method(
                MethodBuilder::new("tick", "V", flags::ACC_PUBLIC)
                    .regs(1, 1, 0)
                    .code(fmt10x(OP_RETURN_VOID)),
            ),
    );
    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();
    (ctx, unit)
}

/// Concurrent resolution of the same indices from many threads must
/// yield one identity per slot, stable ever after.
#[test]
fn test_concurrent_resolution_is_idempotent() {
    const THREADS: usize = 8;
    let (ctx, unit) = fixture();

    let mut handles = Vec::new();
    for i in 0..THREADS {
        let ctx = ctx.clone();
        handles.push(thread::spawn(move || {
            let mut t = ctx.threads.attach(&format!("resolver-{i}"));
            let string = resolve_string(&ctx, &mut t, unit, 0).unwrap();
            let method = resolve_method(&ctx, &mut t, unit, 0).unwrap().id;
            let field = resolve_field(&ctx, &mut t, unit, 0).unwrap().id;
            (string, method, field)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = results[0];
    for r in &results {
        assert_eq!(*r, first);
    }

    // The winning identities stay put on later lookups
    let mut t = ctx.threads.attach("post");
    assert_eq!(resolve_string(&ctx, &mut t, unit, 0).unwrap(), first.0);
    assert_eq!(resolve_method(&ctx, &mut t, unit, 0).unwrap().id, first.1);
    assert_eq!(resolve_field(&ctx, &mut t, unit, 0).unwrap().id, first.2);
}

/// Strings resolved through different units still share one interned
/// identity.
#[test]
fn test_cross_unit_interning() {
    let ctx = Arc::new(RuntimeContext::new(RuntimeOptions::default()).unwrap());
    let mut thread = ctx.threads.attach("main");

    let mut unit_ids = Vec::new();
    for _ in 0..2 {
        let mut b = UnitBuilder::new();
        b.intern("shared-text");
        unit_ids.push(ctx.load_unit(b.build().unwrap()));
    }
    let a = resolve_string(&ctx, &mut thread, unit_ids[0], 0).unwrap();
    let b = resolve_string(&ctx, &mut thread, unit_ids[1], 0).unwrap();
    assert_eq!(a, b);
}
