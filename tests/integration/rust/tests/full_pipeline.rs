//! Whole-VM integration tests
//!
//! Exercises the pipeline across component boundaries: unit assembly,
//! linking, lazy resolution, interpretation on multiple OS threads,
//! stop-the-world suspension racing real bytecode execution, and
//! exception routing through nested interpreted calls.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use class_model::builder::*;
use class_model::opcodes::*;
use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{DispatchKind, JValue, RuntimeOptions};
use interpreter::Interpreter;
use runtime_core::{RuntimeContext, ThreadStatus};
use vm_cli::Runtime;

const STATIC_METHOD: u32 = flags::ACC_PUBLIC | flags::ACC_STATIC;

fn spin_runtime() -> (Arc<RuntimeContext>, Arc<Interpreter>) {
    let ctx = Arc::new(RuntimeContext::new(RuntimeOptions::default()).unwrap());
    let mut b = UnitBuilder::new();

    // spin(n): a long counted loop, all safepoints on backward branches
    let mut spin = Vec::new();
    spin.extend(fmt11n(OP_CONST_4, 0, 0)); // 0 (w1)
    spin.extend(fmt22t(OP_IF_GE, 0, 2, 5)); // 1 (w2): -> 6
    spin.extend(fmt22b(OP_ADD_INT_LIT8, 0, 0, 1)); // 3 (w2)
    spin.extend(fmt10t(OP_GOTO, -4)); // 5 (w1): -> 1
    spin.extend(fmt11x(OP_RETURN, 0)); // 6

    // outer(n) -> inner(n) which throws for negative n; outer catches
    let inner_ref = b.method_ref("demo/Calls", "inner", "II");
    let mut inner = Vec::new();
    inner.extend(fmt21s(OP_IF_LTZ, 1, 3)); // 0 (w2): n < 0 -> 3
    inner.extend(fmt11x(OP_RETURN, 1)); // 2
    inner.extend(fmt11n(OP_CONST_4, 0, 0)); // 3
    inner.extend(fmt12x(OP_DIV_INT_2ADDR, 1, 0)); // 4: raises
    inner.extend(fmt11x(OP_RETURN, 1)); // 5

    let mut outer = Vec::new();
    outer.extend(fmt35c(OP_INVOKE_STATIC, inner_ref, &[1])); // 0 (w3)
    outer.extend(fmt11x(OP_MOVE_RESULT, 0)); // 3
    outer.extend(fmt11x(OP_RETURN, 0)); // 4
    outer.extend(fmt11x(OP_MOVE_EXCEPTION, 0)); // 5: handler
    outer.extend(fmt21s(OP_CONST_16, 0, -1)); // 6 (w2)
    outer.extend(fmt11x(OP_RETURN, 0)); // 8

    b.add_class(
        ClassBuilder::new("demo/Calls", Some("core/Object"))
            .method(
                MethodBuilder::new("spin", "II", STATIC_METHOD)
                    .regs(3, 1, 0)
                    .code(spin),
            )
            .method(
                MethodBuilder::new("inner", "II", STATIC_METHOD)
                    .regs(2, 1, 0)
                    .code(inner),
            )
            .method(
                MethodBuilder::new("outer", "II", STATIC_METHOD)
                    .regs(2, 1, 1)
                    .code(outer)
                    .guarded(0, 5, vec![(Some("core/Throwable"), 5)]),
            ),
    );

    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();
    let interp = Interpreter::new(&ctx.options);
    interp.install(&ctx);
    (ctx, interp)
}

fn run_method(
    ctx: &Arc<RuntimeContext>,
    interp: &Arc<Interpreter>,
    name: &str,
    arg: i32,
) -> Result<JValue, String> {
    let class = ctx.find_class("demo/Calls").unwrap();
    let method = ctx.find_method_in(class, name, "II").unwrap();
    let mut thread = ctx.threads.attach("runner");
    let out = interp
        .invoke_method(ctx, &mut thread, method.id, &[JValue::Int(arg)])
        .map_err(|_| runtime_core::exception::describe(ctx, thread.take_pending().unwrap()));
    ctx.threads.detach(&thread);
    out
}

#[test]
fn test_exception_crosses_interpreted_frames() {
    let (ctx, interp) = spin_runtime();
    // Positive argument: inner returns it untouched
    assert_eq!(run_method(&ctx, &interp, "outer", 9), Ok(JValue::Int(9)));
    // Negative argument: inner faults, outer's catch-all maps it to -1
    assert_eq!(run_method(&ctx, &interp, "outer", -4), Ok(JValue::Int(-1)));
}

/// Stop-the-world suspension must catch real interpreter threads at
/// bytecode safepoints, and the world must restart cleanly.
#[test]
fn test_suspend_all_during_interpretation() {
    const WORKERS: usize = 3;
    let (ctx, interp) = spin_runtime();

    let mut handles = Vec::new();
    for i in 0..WORKERS {
        let ctx = ctx.clone();
        let interp = interp.clone();
        handles.push(thread::spawn(move || {
            let class = ctx.find_class("demo/Calls").unwrap();
            let method = ctx.find_method_in(class, "spin", "II").unwrap();
            let mut thread = ctx.threads.attach(&format!("spinner-{i}"));
            let out = interp.invoke_method(
                &ctx,
                &mut thread,
                method.id,
                &[JValue::Int(4_000_000)],
            );
            ctx.threads.detach(&thread);
            out
        }));
    }

    // Let the spinners get going, then stop the world a few times
    thread::sleep(Duration::from_millis(30));
    for _ in 0..3 {
        ctx.threads.suspend_all(None);
        for control in ctx.threads.controls() {
            let status = control.status();
            assert!(
                status == ThreadStatus::Suspended || status == ThreadStatus::Native,
                "thread {:?} observed {status:?} inside exclusive section",
                control.id
            );
        }
        ctx.threads.resume_all(None);
        thread::sleep(Duration::from_millis(5));
    }

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result, Ok(JValue::Int(4_000_000)));
    }
}

/// The launcher-level pipeline: demo unit, native print, both
/// dispatch strategies through the public Runtime.
#[test]
fn test_launcher_demos_match_across_dispatchers() {
    for dispatch in [DispatchKind::Portable, DispatchKind::Threaded] {
        let rt = Runtime::new(RuntimeOptions {
            dispatch,
            ..RuntimeOptions::default()
        })
        .unwrap();
        assert_eq!(rt.run_demo("sum", 100).unwrap(), JValue::Int(5050));
        assert_eq!(rt.run_demo("fact", 6).unwrap(), JValue::Int(720));
        rt.shutdown();
    }
}
