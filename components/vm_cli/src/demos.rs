//! Built-in demo programs
//!
//! The container loader is external, so the launcher assembles its
//! demonstration unit programmatically: a few interpreted methods plus
//! one native method wired through the bridge.

use class_model::builder::*;
use class_model::opcodes::*;
use class_model::{flags, ClassBuilder, CodeUnit, MethodBuilder, UnitBuilder};
use core_types::{ExecResult, JValue};
use runtime_core::{RuntimeContext, VmThread};

const STATIC_METHOD: u32 = flags::ACC_PUBLIC | flags::ACC_STATIC;

/// Native backing for `demo/Sys.print(I)V`.
fn native_print(
    _ctx: &RuntimeContext,
    _thread: &mut VmThread,
    _recv: JValue,
    args: &[JValue],
) -> ExecResult<JValue> {
    if let Some(JValue::Int(v)) = args.first() {
        println!("{v}");
    }
    Ok(JValue::Void)
}

/// Register the demo unit's native methods.
pub fn register_natives(ctx: &RuntimeContext) {
    ctx.register_native("demo/Sys", "print", "VI", native_print);
}

/// Assemble the demo unit.
pub fn build_demo_unit() -> CodeUnit {
    let mut b = UnitBuilder::new();

    b.add_class(
        ClassBuilder::new("demo/Sys", Some("core/Object")).method(MethodBuilder::new(
            "print",
            "VI",
            STATIC_METHOD | flags::ACC_NATIVE,
        )),
    );

    let print_ref = b.method_ref("demo/Sys", "print", "VI");
    let fact_ref = b.method_ref("demo/Main", "fact", "II");

    // sum(n): accumulate 1..=n, print, return
    let mut sum = Vec::new();
    sum.extend(fmt11n(OP_CONST_4, 0, 0)); // 0
    sum.extend(fmt11n(OP_CONST_4, 1, 1)); // 1
    sum.extend(fmt22t(OP_IF_GT, 1, 2, 6)); // 2: i > n -> 8
    sum.extend(fmt12x(OP_ADD_INT_2ADDR, 0, 1)); // 4
    sum.extend(fmt22b(OP_ADD_INT_LIT8, 1, 1, 1)); // 5
    sum.extend(fmt10t(OP_GOTO, -5)); // 7
    sum.extend(fmt35c(OP_INVOKE_STATIC, print_ref, &[0])); // 8
    sum.extend(fmt11x(OP_RETURN, 0)); // 11

    // fact(n), recursive
    let mut fact = Vec::new();
    fact.extend(fmt11n(OP_CONST_4, 0, 1)); // 0
    fact.extend(fmt22t(OP_IF_GT, 3, 0, 3)); // 1: n > 1 -> 4
    fact.extend(fmt11x(OP_RETURN, 3)); // 3
    fact.extend(fmt22b(OP_ADD_INT_LIT8, 1, 3, -1)); // 4
    fact.extend(fmt35c(OP_INVOKE_STATIC, fact_ref, &[1])); // 6
    fact.extend(fmt11x(OP_MOVE_RESULT, 0)); // 9
    fact.extend(fmt12x(OP_MUL_INT_2ADDR, 0, 3)); // 10
    fact.extend(fmt11x(OP_RETURN, 0)); // 11

    // throw(n): divides by zero with no handler in sight
    let mut boom = Vec::new();
    boom.extend(fmt11n(OP_CONST_4, 0, 0)); // 0
    boom.extend(fmt12x(OP_DIV_INT_2ADDR, 1, 0)); // 1: n / 0
    boom.extend(fmt11x(OP_RETURN, 1)); // 2

    b.add_class(
        ClassBuilder::new("demo/Main", Some("core/Object"))
            .method(
                MethodBuilder::new("sum", "II", STATIC_METHOD)
                    .regs(3, 1, 1)
                    .code(sum),
            )
            .method(
                MethodBuilder::new("fact", "II", STATIC_METHOD)
                    .regs(4, 1, 1)
                    .code(fact),
            )
            .method(
                MethodBuilder::new("throw", "II", STATIC_METHOD)
                    .regs(2, 1, 0)
                    .code(boom),
            ),
    );

    b.build().expect("demo unit validates")
}
