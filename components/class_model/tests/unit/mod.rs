//! Unit tests for the class container model

use class_model::builder::{fmt10x, fmt11n, fmt11x, fmt21c};
use class_model::flags;
use class_model::opcodes::*;
use class_model::{ClassBuilder, MethodBuilder, UnitBuilder};

fn demo_unit_builder() -> UnitBuilder {
    let mut b = UnitBuilder::new();
    let mut code = fmt11n(OP_CONST_4, 0, 7);
    code.extend(fmt11x(OP_RETURN, 0));
    b.add_class(
        ClassBuilder::new("demo/Main", Some("core/Object"))
            .field("counter", "I", flags::ACC_PUBLIC)
            .field("shared", "I", flags::ACC_PUBLIC | flags::ACC_STATIC)
            .method(
                MethodBuilder::new("seven", "I", flags::ACC_PUBLIC | flags::ACC_STATIC)
                    .regs(1, 0, 0)
                    .code(code),
            ),
    );
    b
}

#[test]
fn test_build_round_trip() {
    let unit = demo_unit_builder().build().expect("unit should validate");
    assert_eq!(unit.classes.len(), 1);
    let class = &unit.classes[0];
    assert_eq!(&**unit.type_name(class.name), "demo/Main");
    assert_eq!(class.instance_fields.len(), 1);
    assert_eq!(class.static_fields.len(), 1);
    assert_eq!(class.methods.len(), 1);

    let method = &class.methods[0];
    assert_eq!(&**unit.string(method.name), "seven");
    assert_eq!(&**unit.shorty(method.proto), "I");
    let body = method.body.as_ref().expect("interpreted method has a body");
    assert_eq!(body.insns.len(), 2);
}

#[test]
fn test_string_pool_is_shared_across_tables() {
    let mut b = demo_unit_builder();
    // The method name also used as a plain string should not duplicate
    let before = b.intern("seven");
    let unit = b.build().unwrap();
    assert_eq!(&**unit.string(before), "seven");
}

#[test]
fn test_native_method_has_no_body() {
    let mut b = UnitBuilder::new();
    b.add_class(
        ClassBuilder::new("demo/Nat", Some("core/Object")).method(MethodBuilder::new(
            "now",
            "J",
            flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_NATIVE,
        )),
    );
    let unit = b.build().unwrap();
    assert!(unit.classes[0].methods[0].body.is_none());
}

#[test]
fn test_const_string_references_pool() {
    let mut b = UnitBuilder::new();
    let s = b.intern("greeting");
    let mut code = fmt21c(OP_CONST_STRING, 0, s as u16);
    code.extend(fmt10x(OP_RETURN_VOID));
    b.add_class(
        ClassBuilder::new("demo/Str", Some("core/Object")).method(
            MethodBuilder::new("run", "V", flags::ACC_PUBLIC | flags::ACC_STATIC)
                .regs(1, 0, 0)
                .code(code),
        ),
    );
    let unit = b.build().unwrap();
    assert_eq!(&**unit.string(s), "greeting");
}
