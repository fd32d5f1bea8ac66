//! Unit tests for the interpreter core
//!
//! Each test assembles a small unit, links it, and runs one method
//! through the public interpreter entry point.

use std::sync::Arc;

use class_model::builder::*;
use class_model::opcodes::*;
use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{DispatchKind, JValue, RuntimeOptions};
use interpreter::Interpreter;
use runtime_core::RuntimeContext;

const STATIC_METHOD: u32 = class_model::flags::ACC_PUBLIC | class_model::flags::ACC_STATIC;

struct Fixture {
    ctx: Arc<RuntimeContext>,
    interp: Arc<Interpreter>,
}

impl Fixture {
    fn new(dispatch: DispatchKind, build: impl FnOnce(&mut UnitBuilder)) -> Self {
        let options = RuntimeOptions {
            dispatch,
            ..RuntimeOptions::default()
        };
        let ctx = Arc::new(RuntimeContext::new(options).unwrap());
        let mut b = UnitBuilder::new();
        build(&mut b);
        let unit = ctx.load_unit(b.build().expect("unit validates"));
        resolver::link_unit(&ctx, unit).expect("unit links");
        let interp = Interpreter::new(&ctx.options);
        interp.install(&ctx);
        Self { ctx, interp }
    }

    fn call(&self, class: &str, name: &str, shorty: &str, args: &[JValue]) -> JValue {
        self.try_call(class, name, shorty, args).expect("no exception")
    }

    fn try_call(
        &self,
        class: &str,
        name: &str,
        shorty: &str,
        args: &[JValue],
    ) -> Result<JValue, String> {
        let class_id = self.ctx.find_class(class).expect("class linked");
        let method = self
            .ctx
            .find_method_in(class_id, name, shorty)
            .expect("method exists");
        let mut thread = self.ctx.threads.attach("test");
        let result = self
            .interp
            .invoke_method(&self.ctx, &mut thread, method.id, args);
        let out = result.map_err(|_| {
            let pending = thread.take_pending().expect("err without pending");
            runtime_core::exception::describe(&self.ctx, pending)
        });
        self.ctx.threads.detach(&thread);
        out
    }
}

fn seven_unit(b: &mut UnitBuilder) {
    let mut code = fmt11n(OP_CONST_4, 0, 7);
    code.extend(fmt11x(OP_RETURN, 0));
    b.add_class(
        ClassBuilder::new("demo/Main", Some("core/Object")).method(
            MethodBuilder::new("seven", "I", STATIC_METHOD)
                .regs(1, 0, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_const_return() {
    let f = Fixture::new(DispatchKind::Threaded, seven_unit);
    assert_eq!(f.call("demo/Main", "seven", "I", &[]), JValue::Int(7));
}

#[test]
fn test_const_return_portable() {
    let f = Fixture::new(DispatchKind::Portable, seven_unit);
    assert_eq!(f.call("demo/Main", "seven", "I", &[]), JValue::Int(7));
}

fn sum_unit(b: &mut UnitBuilder) {
    // sum(n): acc = 0; for i in 1..=n acc += i
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 0)); // 0: acc = 0
    code.extend(fmt11n(OP_CONST_4, 1, 1)); // 1: i = 1
    code.extend(fmt22t(OP_IF_GT, 1, 2, 6)); // 2: if i > n -> 8
    code.extend(fmt12x(OP_ADD_INT_2ADDR, 0, 1)); // 4: acc += i
    code.extend(fmt22b(OP_ADD_INT_LIT8, 1, 1, 1)); // 5: i += 1
    code.extend(fmt10t(OP_GOTO, -5)); // 7: -> 2
    code.extend(fmt11x(OP_RETURN, 0)); // 8
    b.add_class(
        ClassBuilder::new("demo/Loops", Some("core/Object")).method(
            MethodBuilder::new("sum", "II", STATIC_METHOD)
                .regs(3, 1, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_backward_branch_loop() {
    let f = Fixture::new(DispatchKind::Threaded, sum_unit);
    assert_eq!(
        f.call("demo/Loops", "sum", "II", &[JValue::Int(10)]),
        JValue::Int(55)
    );
    assert_eq!(
        f.call("demo/Loops", "sum", "II", &[JValue::Int(0)]),
        JValue::Int(0)
    );
}

fn fact_unit(b: &mut UnitBuilder) {
    let fact_ref = b.method_ref("demo/Rec", "fact", "II");
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 1)); // 0: v0 = 1
    code.extend(fmt22t(OP_IF_GT, 3, 0, 3)); // 1: if n > 1 -> 4
    code.extend(fmt11x(OP_RETURN, 3)); // 3: return n
    code.extend(fmt22b(OP_ADD_INT_LIT8, 1, 3, -1)); // 4: v1 = n - 1
    code.extend(fmt35c(OP_INVOKE_STATIC, fact_ref, &[1])); // 6
    code.extend(fmt11x(OP_MOVE_RESULT, 0)); // 9
    code.extend(fmt12x(OP_MUL_INT_2ADDR, 0, 3)); // 10: v0 *= n
    code.extend(fmt11x(OP_RETURN, 0)); // 11
    b.add_class(
        ClassBuilder::new("demo/Rec", Some("core/Object")).method(
            MethodBuilder::new("fact", "II", STATIC_METHOD)
                .regs(4, 1, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_recursive_invoke_static() {
    let f = Fixture::new(DispatchKind::Threaded, fact_unit);
    assert_eq!(
        f.call("demo/Rec", "fact", "II", &[JValue::Int(6)]),
        JValue::Int(720)
    );
}

fn catch_unit(b: &mut UnitBuilder) {
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 5)); // 0
    code.extend(fmt11n(OP_CONST_4, 1, 0)); // 1
    code.extend(fmt12x(OP_DIV_INT_2ADDR, 0, 1)); // 2: faults
    code.extend(fmt11x(OP_RETURN, 0)); // 3
    code.extend(fmt11x(OP_MOVE_EXCEPTION, 1)); // 4: handler
    code.extend(fmt21s(OP_CONST_16, 0, 42)); // 5
    code.extend(fmt11x(OP_RETURN, 0)); // 7
    b.add_class(
        ClassBuilder::new("demo/Catch", Some("core/Object")).method(
            MethodBuilder::new("catcher", "I", STATIC_METHOD)
                .regs(2, 0, 0)
                .code(code)
                .guarded(2, 1, vec![(Some("core/ArithmeticException"), 4)]),
        ),
    );
}

#[test]
fn test_divide_by_zero_caught() {
    let f = Fixture::new(DispatchKind::Threaded, catch_unit);
    assert_eq!(f.call("demo/Catch", "catcher", "I", &[]), JValue::Int(42));
}

#[test]
fn test_uncaught_exception_reports_class() {
    let f = Fixture::new(DispatchKind::Threaded, |b| {
        let mut code = Vec::new();
        code.extend(fmt11n(OP_CONST_4, 0, 1));
        code.extend(fmt11n(OP_CONST_4, 1, 0));
        code.extend(fmt12x(OP_DIV_INT_2ADDR, 0, 1));
        code.extend(fmt11x(OP_RETURN, 0));
        b.add_class(
            ClassBuilder::new("demo/Boom", Some("core/Object")).method(
                MethodBuilder::new("boom", "I", STATIC_METHOD)
                    .regs(2, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = f.try_call("demo/Boom", "boom", "I", &[]).unwrap_err();
    assert!(err.contains("core/ArithmeticException"), "{err}");
}

fn nested_unit(b: &mut UnitBuilder) {
    // Both ranges cover the faulting pc; the inner one is listed first
    // and catches by a broader (assignable) type
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 3)); // 0
    code.extend(fmt11n(OP_CONST_4, 1, 0)); // 1
    code.extend(fmt12x(OP_DIV_INT_2ADDR, 0, 1)); // 2: faults
    code.extend(fmt11x(OP_RETURN, 0)); // 3
    code.extend(fmt11n(OP_CONST_4, 0, 1)); // 4: inner handler
    code.extend(fmt11x(OP_RETURN, 0)); // 5
    code.extend(fmt11n(OP_CONST_4, 0, 2)); // 6: outer handler
    code.extend(fmt11x(OP_RETURN, 0)); // 7
    b.add_class(
        ClassBuilder::new("demo/Nested", Some("core/Object")).method(
            MethodBuilder::new("pick", "I", STATIC_METHOD)
                .regs(2, 0, 0)
                .code(code)
                .guarded(2, 1, vec![(Some("core/Exception"), 4)])
                .guarded(0, 4, vec![(Some("core/ArithmeticException"), 6)]),
        ),
    );
}

#[test]
fn test_innermost_handler_wins() {
    let f = Fixture::new(DispatchKind::Threaded, nested_unit);
    assert_eq!(f.call("demo/Nested", "pick", "I", &[]), JValue::Int(1));
}

fn virtual_unit(b: &mut UnitBuilder) {
    let init_ref = b.method_ref("demo/Derived", "<init>", "V");
    let speak_ref = b.method_ref("demo/Base", "speak", "I");

    let mut ret1 = fmt11n(OP_CONST_4, 0, 1);
    ret1.extend(fmt11x(OP_RETURN, 0));
    let mut ret2 = fmt11n(OP_CONST_4, 0, 2);
    ret2.extend(fmt11x(OP_RETURN, 0));

    b.add_class(
        ClassBuilder::new("demo/Base", Some("core/Object")).method(
            MethodBuilder::new("speak", "I", flags::ACC_PUBLIC)
                .regs(2, 1, 0)
                .code(ret1),
        ),
    );
    b.add_class(
        ClassBuilder::new("demo/Derived", Some("demo/Base"))
            .method(
                MethodBuilder::new("<init>", "V", flags::ACC_PUBLIC | flags::ACC_CONSTRUCTOR)
                    .regs(1, 1, 0)
                    .code(fmt10x(OP_RETURN_VOID)),
            )
            .method(
                MethodBuilder::new("speak", "I", flags::ACC_PUBLIC)
                    .regs(2, 1, 0)
                    .code(ret2),
            ),
    );

    let mut code = Vec::new();
    code.extend(fmt21c(OP_NEW_INSTANCE, 0, b.type_idx("demo/Derived") as u16)); // 0
    code.extend(fmt35c(OP_INVOKE_DIRECT, init_ref, &[0])); // 2
    code.extend(fmt35c(OP_INVOKE_VIRTUAL, speak_ref, &[0])); // 5
    code.extend(fmt11x(OP_MOVE_RESULT, 1)); // 8
    code.extend(fmt11x(OP_RETURN, 1)); // 9
    b.add_class(
        ClassBuilder::new("demo/Probe", Some("core/Object")).method(
            MethodBuilder::new("probe", "I", STATIC_METHOD)
                .regs(2, 0, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_virtual_dispatch_uses_override() {
    let f = Fixture::new(DispatchKind::Threaded, virtual_unit);
    assert_eq!(f.call("demo/Probe", "probe", "I", &[]), JValue::Int(2));
}

fn array_unit(b: &mut UnitBuilder) {
    let int_array = b.type_idx("[I") as u16;
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 4)); // 0: len
    code.extend(fmt22t(OP_NEW_ARRAY, 1, 0, int_array)); // 1: v1 = new int[4]
    code.extend(fmt11n(OP_CONST_4, 0, 2)); // 3: idx
    code.extend(fmt21s(OP_CONST_16, 2, 99)); // 4
    code.extend(fmt23x(OP_APUT, 2, 1, 0)); // 6: v1[2] = 99
    code.extend(fmt23x(OP_AGET, 0, 1, 0)); // 8: v0 = v1[2]
    code.extend(fmt12x(OP_ARRAY_LENGTH, 1, 1)); // 10: v1 = len
    code.extend(fmt12x(OP_ADD_INT_2ADDR, 0, 1)); // 11: v0 += v1
    code.extend(fmt11x(OP_RETURN, 0)); // 12
    b.add_class(
        ClassBuilder::new("demo/Arr", Some("core/Object")).method(
            MethodBuilder::new("arr", "I", STATIC_METHOD)
                .regs(3, 0, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_array_round_trip_and_length() {
    let f = Fixture::new(DispatchKind::Threaded, array_unit);
    assert_eq!(f.call("demo/Arr", "arr", "I", &[]), JValue::Int(103));
}

#[test]
fn test_array_bounds_violation() {
    let f = Fixture::new(DispatchKind::Threaded, |b| {
        let int_array = b.type_idx("[I") as u16;
        let mut code = Vec::new();
        code.extend(fmt11n(OP_CONST_4, 0, 2));
        code.extend(fmt22t(OP_NEW_ARRAY, 1, 0, int_array));
        code.extend(fmt11n(OP_CONST_4, 0, 5)); // out of range
        code.extend(fmt23x(OP_AGET, 0, 1, 0));
        code.extend(fmt11x(OP_RETURN, 0));
        b.add_class(
            ClassBuilder::new("demo/Oob", Some("core/Object")).method(
                MethodBuilder::new("oob", "I", STATIC_METHOD)
                    .regs(3, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = f.try_call("demo/Oob", "oob", "I", &[]).unwrap_err();
    assert!(err.contains("ArrayIndexOutOfBounds"), "{err}");
}

fn cmp_unit(b: &mut UnitBuilder) {
    let mut cmpl = fmt23x(OP_CMPL_FLOAT, 0, 1, 2);
    cmpl.extend(fmt11x(OP_RETURN, 0));
    let mut cmpg = fmt23x(OP_CMPG_FLOAT, 0, 1, 2);
    cmpg.extend(fmt11x(OP_RETURN, 0));
    let mut dcmpl = fmt23x(OP_CMPL_DOUBLE, 0, 1, 3);
    dcmpl.extend(fmt11x(OP_RETURN, 0));
    let mut dcmpg = fmt23x(OP_CMPG_DOUBLE, 0, 1, 3);
    dcmpg.extend(fmt11x(OP_RETURN, 0));
    b.add_class(
        ClassBuilder::new("demo/Cmp", Some("core/Object"))
            .method(
                MethodBuilder::new("cmpl", "IFF", STATIC_METHOD)
                    .regs(3, 2, 0)
                    .code(cmpl),
            )
            .method(
                MethodBuilder::new("cmpg", "IFF", STATIC_METHOD)
                    .regs(3, 2, 0)
                    .code(cmpg),
            )
            .method(
                MethodBuilder::new("dcmpl", "IDD", STATIC_METHOD)
                    .regs(5, 4, 0)
                    .code(dcmpl),
            )
            .method(
                MethodBuilder::new("dcmpg", "IDD", STATIC_METHOD)
                    .regs(5, 4, 0)
                    .code(dcmpg),
            ),
    );
}

#[test]
fn test_float_compare_nan_tie_breaks() {
    let f = Fixture::new(DispatchKind::Threaded, cmp_unit);
    let nan = JValue::Float(f32::NAN);
    let one = JValue::Float(1.0);
    assert_eq!(f.call("demo/Cmp", "cmpl", "IFF", &[nan, one]), JValue::Int(-1));
    assert_eq!(f.call("demo/Cmp", "cmpg", "IFF", &[nan, one]), JValue::Int(1));
    assert_eq!(f.call("demo/Cmp", "cmpl", "IFF", &[one, one]), JValue::Int(0));
    assert_eq!(f.call("demo/Cmp", "cmpg", "IFF", &[one, one]), JValue::Int(0));

    let dnan = JValue::Double(f64::NAN);
    let done = JValue::Double(1.0);
    assert_eq!(
        f.call("demo/Cmp", "dcmpl", "IDD", &[dnan, done]),
        JValue::Int(-1)
    );
    assert_eq!(
        f.call("demo/Cmp", "dcmpg", "IDD", &[dnan, done]),
        JValue::Int(1)
    );
}

fn static_unit(b: &mut UnitBuilder) {
    let seed_ref = b.field_ref("demo/Counter", "seed", "I");
    let mut clinit = fmt21s(OP_CONST_16, 0, 41);
    clinit.extend(fmt21c(OP_SPUT, 0, seed_ref));
    clinit.extend(fmt10x(OP_RETURN_VOID));
    let mut probe = fmt21c(OP_SGET, 0, seed_ref);
    probe.extend(fmt22b(OP_ADD_INT_LIT8, 0, 0, 1));
    probe.extend(fmt11x(OP_RETURN, 0));
    b.add_class(
        ClassBuilder::new("demo/Counter", Some("core/Object"))
            .field("seed", "I", STATIC_METHOD)
            .method(
                MethodBuilder::new("<clinit>", "V", flags::ACC_STATIC | flags::ACC_CONSTRUCTOR)
                    .regs(1, 0, 0)
                    .code(clinit),
            )
            .method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(1, 0, 0)
                    .code(probe),
            ),
    );
}

#[test]
fn test_clinit_runs_before_static_access() {
    let f = Fixture::new(DispatchKind::Threaded, static_unit);
    assert_eq!(f.call("demo/Counter", "probe", "I", &[]), JValue::Int(42));
}

fn switch_unit(b: &mut UnitBuilder) {
    // packed-switch over the argument: 10 -> 1, 11 -> 2, else 0
    let mut code = Vec::new();
    code.extend(fmt31i(OP_PACKED_SWITCH, 1, 9)); // 0: table at 9
    code.extend(fmt11n(OP_CONST_4, 0, 0)); // 3: default
    code.extend(fmt11x(OP_RETURN, 0)); // 4
    code.extend(fmt11n(OP_CONST_4, 0, 1)); // 5: key 10
    code.extend(fmt11x(OP_RETURN, 0)); // 6
    code.extend(fmt11n(OP_CONST_4, 0, 2)); // 7: key 11
    code.extend(fmt11x(OP_RETURN, 0)); // 8
    code.extend(packed_switch_payload(10, &[5, 7])); // 9
    b.add_class(
        ClassBuilder::new("demo/Sw", Some("core/Object")).method(
            MethodBuilder::new("pick", "II", STATIC_METHOD)
                .regs(2, 1, 0)
                .code(code),
        ),
    );
}

#[test]
fn test_packed_switch_targets() {
    let f = Fixture::new(DispatchKind::Threaded, switch_unit);
    assert_eq!(
        f.call("demo/Sw", "pick", "II", &[JValue::Int(10)]),
        JValue::Int(1)
    );
    assert_eq!(
        f.call("demo/Sw", "pick", "II", &[JValue::Int(11)]),
        JValue::Int(2)
    );
    assert_eq!(
        f.call("demo/Sw", "pick", "II", &[JValue::Int(12)]),
        JValue::Int(0)
    );
    assert_eq!(
        f.call("demo/Sw", "pick", "II", &[JValue::Int(-3)]),
        JValue::Int(0)
    );
}

fn wide_unit(b: &mut UnitBuilder) {
    // (1 << 40) + arg, returned as long
    let mut code = Vec::new();
    code.extend(fmt51l(OP_CONST_WIDE, 0, 1u64 << 40)); // 0 (w5)
    code.extend(fmt12x(OP_ADD_LONG_2ADDR_ALIAS, 0, 4)); // 5
    code.extend(fmt11x(OP_RETURN_WIDE, 0)); // 6
    b.add_class(
        ClassBuilder::new("demo/Wide", Some("core/Object")).method(
            MethodBuilder::new("bump", "JJ", STATIC_METHOD)
                .regs(6, 2, 0)
                .code(code),
        ),
    );
}

// add-long/2addr sits at 0xb0 + 11
const OP_ADD_LONG_2ADDR_ALIAS: u8 = 0xbb;

#[test]
fn test_wide_arithmetic() {
    let f = Fixture::new(DispatchKind::Threaded, wide_unit);
    assert_eq!(
        f.call("demo/Wide", "bump", "JJ", &[JValue::Long(2)]),
        JValue::Long((1i64 << 40) + 2)
    );
}

#[test]
fn test_check_cast_failure() {
    let f = Fixture::new(DispatchKind::Threaded, |b| {
        let other = b.type_idx("demo/Other") as u16;
        b.add_class(ClassBuilder::new("demo/Other", Some("core/Object")));
        let s = b.intern("hello");
        let mut code = Vec::new();
        code.extend(fmt21c(OP_CONST_STRING, 0, s as u16)); // 0
        code.extend(fmt21c(OP_CHECK_CAST, 0, other)); // 2
        code.extend(fmt11n(OP_CONST_4, 0, 1)); // 4
        code.extend(fmt11x(OP_RETURN, 0)); // 5
        b.add_class(
            ClassBuilder::new("demo/Cast", Some("core/Object")).method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(1, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = f.try_call("demo/Cast", "probe", "I", &[]).unwrap_err();
    assert!(err.contains("ClassCastException"), "{err}");
}

#[test]
fn test_instance_fields_round_trip() {
    let f = Fixture::new(DispatchKind::Threaded, |b| {
        let init_ref = b.method_ref("demo/Holder", "<init>", "V");
        let field_ref = b.field_ref("demo/Holder", "value", "I");
        b.add_class(
            ClassBuilder::new("demo/Holder", Some("core/Object"))
                .field("value", "I", flags::ACC_PUBLIC)
                .method(
                    MethodBuilder::new("<init>", "V", flags::ACC_PUBLIC | flags::ACC_CONSTRUCTOR)
                        .regs(1, 1, 0)
                        .code(fmt10x(OP_RETURN_VOID)),
                ),
        );
        let mut code = Vec::new();
        code.extend(fmt21c(OP_NEW_INSTANCE, 0, b.type_idx("demo/Holder") as u16)); // 0
        code.extend(fmt35c(OP_INVOKE_DIRECT, init_ref, &[0])); // 2
        code.extend(fmt21s(OP_CONST_16, 1, 63)); // 5
        code.extend(fmt22t(OP_IPUT, 1, 0, field_ref)); // 7
        code.extend(fmt22t(OP_IGET, 2, 0, field_ref)); // 9
        code.extend(fmt11x(OP_RETURN, 2)); // 11
        b.add_class(
            ClassBuilder::new("demo/FieldProbe", Some("core/Object")).method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(3, 0, 0)
                    .code(code),
            ),
        );
    });
    assert_eq!(f.call("demo/FieldProbe", "probe", "I", &[]), JValue::Int(63));
}

#[test]
fn test_null_field_access_raises_npe() {
    let f = Fixture::new(DispatchKind::Threaded, |b| {
        let field_ref = b.field_ref("demo/Holder2", "value", "I");
        b.add_class(
            ClassBuilder::new("demo/Holder2", Some("core/Object"))
                .field("value", "I", flags::ACC_PUBLIC),
        );
        let mut code = Vec::new();
        code.extend(fmt11n(OP_CONST_4, 0, 0)); // null
        code.extend(fmt22t(OP_IGET, 1, 0, field_ref));
        code.extend(fmt11x(OP_RETURN, 1));
        b.add_class(
            ClassBuilder::new("demo/NullProbe", Some("core/Object")).method(
                MethodBuilder::new("probe", "I", STATIC_METHOD)
                    .regs(2, 0, 0)
                    .code(code),
            ),
        );
    });
    let err = f.try_call("demo/NullProbe", "probe", "I", &[]).unwrap_err();
    assert!(err.contains("NullPointerException"), "{err}");
}
