//! Integration tests: dispatch parity, breakpoints, stack limits
//!
//! The golden-corpus parity test runs every program under both
//! dispatch strategies and requires identical results; the breakpoint
//! test checks trap transparency end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use class_model::builder::*;
use class_model::opcodes::*;
use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{DispatchKind, JValue, MethodId, RuntimeOptions, ThreadId};
use interpreter::{DebugHooks, Interpreter};
use runtime_core::{RuntimeContext, VmThread};

const STATIC_METHOD: u32 = flags::ACC_PUBLIC | flags::ACC_STATIC;

fn build_runtime(
    dispatch: DispatchKind,
    stack_slots: usize,
    build: impl FnOnce(&mut UnitBuilder),
) -> (Arc<RuntimeContext>, Arc<Interpreter>) {
    let options = RuntimeOptions {
        dispatch,
        stack_region_slots: stack_slots,
        ..RuntimeOptions::default()
    };
    let ctx = Arc::new(RuntimeContext::new(options).unwrap());
    let mut b = UnitBuilder::new();
    build(&mut b);
    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();
    let interp = Interpreter::new(&ctx.options);
    interp.install(&ctx);
    (ctx, interp)
}

fn call(
    ctx: &RuntimeContext,
    interp: &Interpreter,
    class: &str,
    name: &str,
    shorty: &str,
    args: &[JValue],
) -> Result<JValue, String> {
    let class_id = ctx.find_class(class).expect("class linked");
    let method = ctx
        .find_method_in(class_id, name, shorty)
        .expect("method exists");
    let mut thread = ctx.threads.attach("it");
    let out = interp
        .invoke_method(ctx, &mut thread, method.id, args)
        .map_err(|_| {
            runtime_core::exception::describe(ctx, thread.take_pending().unwrap())
        });
    ctx.threads.detach(&thread);
    out
}

/// Corpus shared by the parity test: (class, method, shorty, args,
/// builder).
fn corpus_unit(b: &mut UnitBuilder) {
    // gcd(a, b) by subtraction
    let mut gcd = Vec::new();
    gcd.extend(fmt22t(OP_IF_NE, 2, 3, 3)); // 0: if a != b -> 3
    gcd.extend(fmt11x(OP_RETURN, 2)); // 2
    gcd.extend(fmt22t(OP_IF_GE, 3, 2, 5)); // 3: if b >= a -> 8
    gcd.extend(fmt12x(OP_SUB_INT_2ADDR, 2, 3)); // 5: a -= b
    gcd.extend(fmt10t(OP_GOTO, -6)); // 6: -> 0
    gcd.extend(fmt10t(OP_GOTO, -7)); // 7: unreachable pad -> 0
    gcd.extend(fmt12x(OP_SUB_INT_2ADDR, 3, 2)); // 8: b -= a
    gcd.extend(fmt10t(OP_GOTO, -9)); // 9: -> 0

    // mixed-width arithmetic: ((x as long) * 3 - 1) as int
    let mut mix = Vec::new();
    mix.extend(fmt12x(OP_INT_TO_LONG, 0, 4)); // 0: v0v1 = (long)x
    mix.extend(fmt21s(OP_CONST_WIDE_16, 2, 3)); // 1
    mix.extend(fmt12x(0xbd, 0, 2)); // 3: mul-long/2addr
    mix.extend(fmt21s(OP_CONST_WIDE_16, 2, 1)); // 4
    mix.extend(fmt12x(0xbc, 0, 2)); // 6: sub-long/2addr
    mix.extend(fmt12x(OP_LONG_TO_INT, 0, 0)); // 7
    mix.extend(fmt11x(OP_RETURN, 0)); // 8

    // shift/mask playground on literals
    let mut bits = Vec::new();
    bits.extend(fmt22b(OP_SHL_INT_LIT8, 1, 4, 3)); // 0: v1 = x << 3
    bits.extend(fmt22b(OP_USHR_INT_LIT8, 2, 4, 1)); // 2: v2 = x >>> 1
    bits.extend(fmt23x(OP_XOR_INT, 0, 1, 2)); // 4
    bits.extend(fmt22b(OP_AND_INT_LIT8, 0, 0, 0x5f)); // 6
    bits.extend(fmt11x(OP_RETURN, 0)); // 8

    b.add_class(
        ClassBuilder::new("demo/Golden", Some("core/Object"))
            .method(
                MethodBuilder::new("gcd", "III", STATIC_METHOD)
                    .regs(4, 2, 0)
                    .code(gcd),
            )
            .method(
                MethodBuilder::new("mix", "II", STATIC_METHOD)
                    .regs(5, 1, 0)
                    .code(mix),
            )
            .method(
                MethodBuilder::new("bits", "II", STATIC_METHOD)
                    .regs(5, 1, 0)
                    .code(bits),
            ),
    );
}

#[test]
fn test_dispatch_strategies_bit_identical() {
    let cases: &[(&str, &str, Vec<JValue>)] = &[
        ("gcd", "III", vec![JValue::Int(48), JValue::Int(18)]),
        ("gcd", "III", vec![JValue::Int(17), JValue::Int(5)]),
        ("mix", "II", vec![JValue::Int(41)]),
        ("mix", "II", vec![JValue::Int(-7)]),
        ("bits", "II", vec![JValue::Int(0x1234)]),
        ("bits", "II", vec![JValue::Int(-1)]),
    ];
    let (pctx, pinterp) = build_runtime(DispatchKind::Portable, 16 * 1024, corpus_unit);
    let (tctx, tinterp) = build_runtime(DispatchKind::Threaded, 16 * 1024, corpus_unit);
    for (name, shorty, args) in cases {
        let portable = call(&pctx, &pinterp, "demo/Golden", name, shorty, args);
        let threaded = call(&tctx, &tinterp, "demo/Golden", name, shorty, args);
        assert_eq!(portable, threaded, "{name}{shorty} diverged");
    }
}

fn sum_unit(b: &mut UnitBuilder) {
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 0)); // 0
    code.extend(fmt11n(OP_CONST_4, 1, 1)); // 1
    code.extend(fmt22t(OP_IF_GT, 1, 2, 6)); // 2
    code.extend(fmt12x(OP_ADD_INT_2ADDR, 0, 1)); // 4: breakpoint target
    code.extend(fmt22b(OP_ADD_INT_LIT8, 1, 1, 1)); // 5
    code.extend(fmt10t(OP_GOTO, -5)); // 7
    code.extend(fmt11x(OP_RETURN, 0)); // 8
    b.add_class(
        ClassBuilder::new("demo/Loops", Some("core/Object")).method(
            MethodBuilder::new("sum", "II", STATIC_METHOD)
                .regs(3, 1, 0)
                .code(code),
        ),
    );
}

#[derive(Default)]
struct CountingHooks {
    hits: AtomicUsize,
}

impl DebugHooks for CountingHooks {
    fn on_breakpoint(&self, _: &RuntimeContext, _: &VmThread, _: MethodId, _: u32) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
    fn on_thread_death(&self, _: &RuntimeContext, _: ThreadId) {}
}

#[test]
fn test_breakpoint_is_transparent() {
    let (ctx, interp) = build_runtime(DispatchKind::Threaded, 16 * 1024, sum_unit);
    let args = [JValue::Int(5)];

    let clean = call(&ctx, &interp, "demo/Loops", "sum", "II", &args).unwrap();
    assert_eq!(clean, JValue::Int(15));

    // Arm the loop-body add and rerun: same result, one notification
    // per iteration
    let class_id = ctx.find_class("demo/Loops").unwrap();
    let method = ctx.find_method_in(class_id, "sum", "II").unwrap();
    let hooks = Arc::new(CountingHooks::default());
    interp.set_hooks(hooks.clone());
    assert!(interp.instrumentation().arm(&method, 4));

    let trapped = call(&ctx, &interp, "demo/Loops", "sum", "II", &args).unwrap();
    assert_eq!(trapped, clean);
    assert_eq!(hooks.hits.load(Ordering::SeqCst), 5);

    // Detach reverts the trap; the next run is notification-free
    interp.clear_hooks();
    let after = call(&ctx, &interp, "demo/Loops", "sum", "II", &args).unwrap();
    assert_eq!(after, clean);
    assert_eq!(hooks.hits.load(Ordering::SeqCst), 5);
    assert_eq!(interp.instrumentation().count(), 0);
}

#[test]
fn test_runaway_recursion_overflows() {
    let (ctx, interp) = build_runtime(DispatchKind::Threaded, 64, |b| {
        let self_ref = b.method_ref("demo/Deep", "dive", "V");
        let mut code = fmt35c(OP_INVOKE_STATIC, self_ref, &[]);
        code.extend(fmt10x(OP_RETURN_VOID));
        b.add_class(
            ClassBuilder::new("demo/Deep", Some("core/Object")).method(
                MethodBuilder::new("dive", "V", STATIC_METHOD)
                    .regs(4, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = call(&ctx, &interp, "demo/Deep", "dive", "V", &[]).unwrap_err();
    assert!(err.contains("StackOverflowError"), "{err}");
}

#[test]
fn test_monitor_opcodes_balance() {
    let (ctx, interp) = build_runtime(DispatchKind::Threaded, 16 * 1024, |b| {
        let init_ref = b.method_ref("demo/Locky", "<init>", "V");
        b.add_class(
            ClassBuilder::new("demo/Locky", Some("core/Object")).method(
                MethodBuilder::new("<init>", "V", flags::ACC_PUBLIC | flags::ACC_CONSTRUCTOR)
                    .regs(1, 1, 0)
                    .code(fmt10x(OP_RETURN_VOID)),
            ),
        );
        let mut code = Vec::new();
        code.extend(fmt21c(OP_NEW_INSTANCE, 0, b.type_idx("demo/Locky") as u16)); // 0
        code.extend(fmt35c(OP_INVOKE_DIRECT, init_ref, &[0])); // 2
        code.extend(fmt11x(OP_MONITOR_ENTER, 0)); // 5
        code.extend(fmt11n(OP_CONST_4, 1, 3)); // 6
        code.extend(fmt11x(OP_MONITOR_EXIT, 0)); // 7
        code.extend(fmt11x(OP_RETURN, 1)); // 8
        b.add_class(
            ClassBuilder::new("demo/Sync", Some("core/Object")).method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(2, 0, 0)
                    .code(code),
            ),
        );
    });
    assert_eq!(
        call(&ctx, &interp, "demo/Sync", "probe", "I", &[]).unwrap(),
        JValue::Int(3)
    );
}

#[test]
fn test_unbalanced_monitor_exit_raises() {
    let (ctx, interp) = build_runtime(DispatchKind::Threaded, 16 * 1024, |b| {
        let init_ref = b.method_ref("demo/Locky2", "<init>", "V");
        b.add_class(
            ClassBuilder::new("demo/Locky2", Some("core/Object")).method(
                MethodBuilder::new("<init>", "V", flags::ACC_PUBLIC | flags::ACC_CONSTRUCTOR)
                    .regs(1, 1, 0)
                    .code(fmt10x(OP_RETURN_VOID)),
            ),
        );
        let mut code = Vec::new();
        code.extend(fmt21c(OP_NEW_INSTANCE, 0, b.type_idx("demo/Locky2") as u16));
        code.extend(fmt35c(OP_INVOKE_DIRECT, init_ref, &[0]));
        code.extend(fmt11x(OP_MONITOR_EXIT, 0)); // never entered
        code.extend(fmt11n(OP_CONST_4, 1, 0));
        code.extend(fmt11x(OP_RETURN, 1));
        b.add_class(
            ClassBuilder::new("demo/Sync2", Some("core/Object")).method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(2, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = call(&ctx, &interp, "demo/Sync2", "probe", "I", &[]).unwrap_err();
    assert!(err.contains("IllegalMonitorState"), "{err}");
}
