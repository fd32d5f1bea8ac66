//! End-to-end native dispatch tests

use std::sync::Arc;

use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{ExecResult, JValue, RuntimeOptions};
use native_bridge::{invoke_native, GenericCall, HintedCall};
use runtime_core::{RuntimeContext, VmThread};

fn add_impl(
    _ctx: &RuntimeContext,
    _thread: &mut VmThread,
    _recv: JValue,
    args: &[JValue],
) -> ExecResult<JValue> {
    let (JValue::Int(a), JValue::Long(b)) = (args[0], args[1]) else {
        panic!("marshaling handed wrong types");
    };
    Ok(JValue::Long(a as i64 + b))
}

fn truth_impl(
    _ctx: &RuntimeContext,
    _thread: &mut VmThread,
    _recv: JValue,
    _args: &[JValue],
) -> ExecResult<JValue> {
    // Deliberately dirty upper bits; the bridge must widen per the
    // signature's leading Z
    Ok(JValue::Int(0x0101))
}

fn fixture() -> (RuntimeContext, Arc<class_model::MethodDef>, Arc<class_model::MethodDef>) {
    let ctx = RuntimeContext::new(RuntimeOptions::default()).unwrap();
    let mut b = UnitBuilder::new();
    b.method_ref("demo/Native", "add", "JIJ");
    b.method_ref("demo/Native", "truth", "Z");
    b.add_class(
        ClassBuilder::new("demo/Native", Some("core/Object"))
            .method(MethodBuilder::new(
                "add",
                "JIJ",
                flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_NATIVE,
            ))
            .method(MethodBuilder::new(
                "truth",
                "Z",
                flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_NATIVE,
            )),
    );
    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();
    ctx.register_native("demo/Native", "add", "JIJ", add_impl);
    ctx.register_native("demo/Native", "truth", "Z", truth_impl);

    let mut thread = ctx.threads.attach("setup");
    let add = resolver::resolve_method(&ctx, &mut thread, unit, 0).unwrap();
    let truth = resolver::resolve_method(&ctx, &mut thread, unit, 1).unwrap();
    (ctx, add, truth)
}

#[test]
fn test_native_add_via_both_strategies() {
    let (ctx, add, _) = fixture();
    let mut thread = ctx.threads.attach("main");
    // (int 5, long 37) packed as 3 register slots
    let window = [5u32, 37, 0];
    let generic = invoke_native(&ctx, &mut thread, &add, &window, &GenericCall).unwrap();
    let hinted = invoke_native(&ctx, &mut thread, &add, &window, &HintedCall::default()).unwrap();
    assert_eq!(generic, JValue::Long(42));
    assert_eq!(generic, hinted);
}

#[test]
fn test_boolean_return_is_widened() {
    let (ctx, _, truth) = fixture();
    let mut thread = ctx.threads.attach("main");
    let result = invoke_native(&ctx, &mut thread, &truth, &[], &HintedCall::default()).unwrap();
    // 0x0101 narrowed to its low byte, sign-extended
    assert_eq!(result, JValue::Int(1));
}

#[test]
fn test_missing_native_registration_raises() {
    let (ctx, _, _) = fixture();
    let mut b = UnitBuilder::new();
    b.method_ref("demo/Native2", "ghost", "V");
    b.add_class(
        ClassBuilder::new("demo/Native2", Some("core/Object")).method(MethodBuilder::new(
            "ghost",
            "V",
            flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_NATIVE,
        )),
    );
    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();

    let mut thread = ctx.threads.attach("main");
    let ghost = resolver::resolve_method(&ctx, &mut thread, unit, 0).unwrap();
    assert!(invoke_native(&ctx, &mut thread, &ghost, &[], &GenericCall).is_err());
    let text = runtime_core::exception::describe(&ctx, thread.take_pending().unwrap());
    assert!(text.contains("LinkageError"), "{text}");
}

#[test]
fn test_local_pins_released_after_call() {
    let (ctx, add, _) = fixture();
    let mut thread = ctx.threads.attach("main");
    let before = thread.local_refs.len();
    invoke_native(&ctx, &mut thread, &add, &[1, 2, 0], &GenericCall).unwrap();
    assert_eq!(thread.local_refs.len(), before);
}
