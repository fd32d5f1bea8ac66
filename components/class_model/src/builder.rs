//! Programmatic unit construction
//!
//! The binary container parser is an external collaborator, so units
//! reach the VM through this builder: tests, the demo program and
//! embedders assemble pools, classes and bytecode directly. `build`
//! runs the structural checks the loader would normally vouch for.
//!
//! The `fmt*` helpers encode single instructions; names follow the
//! format convention described in [`crate::opcodes`].

use std::collections::HashMap;
use std::sync::Arc;

use core_types::VmError;

use crate::flags;
use crate::opcodes::insn_width;
use crate::unit::{
    CatchHandler, ClassItem, CodeUnit, FieldItem, FieldRefItem, MethodBody, MethodItem,
    MethodRefItem, TryItem,
};

/// Encode a no-operand instruction.
pub fn fmt10x(op: u8) -> Vec<u16> {
    vec![op as u16]
}

/// Encode two nibble registers (also `11n` with `b` as the literal).
pub fn fmt12x(op: u8, a: u8, b: u8) -> Vec<u16> {
    debug_assert!(a < 16 && b < 16);
    vec![op as u16 | ((a as u16) << 8) | ((b as u16) << 12)]
}

/// Encode a nibble register and a signed 4-bit literal.
pub fn fmt11n(op: u8, a: u8, lit: i8) -> Vec<u16> {
    debug_assert!(a < 16 && (-8..8).contains(&lit));
    fmt12x(op, a, (lit as u8) & 0xf)
}

/// Encode one full-byte register.
pub fn fmt11x(op: u8, aa: u8) -> Vec<u16> {
    vec![op as u16 | ((aa as u16) << 8)]
}

/// Encode a signed 8-bit branch offset.
pub fn fmt10t(op: u8, off: i8) -> Vec<u16> {
    vec![op as u16 | (((off as u8) as u16) << 8)]
}

/// Encode a signed 16-bit branch offset.
pub fn fmt20t(op: u8, off: i16) -> Vec<u16> {
    vec![op as u16, off as u16]
}

/// Encode an 8-bit destination and 16-bit source register.
pub fn fmt22x(op: u8, aa: u8, bbbb: u16) -> Vec<u16> {
    vec![op as u16 | ((aa as u16) << 8), bbbb]
}

/// Encode a register and a signed 16-bit value (literal or offset).
pub fn fmt21s(op: u8, aa: u8, value: i16) -> Vec<u16> {
    vec![op as u16 | ((aa as u16) << 8), value as u16]
}

/// Encode a register and a 16-bit pool index.
pub fn fmt21c(op: u8, aa: u8, index: u16) -> Vec<u16> {
    vec![op as u16 | ((aa as u16) << 8), index]
}

/// Encode a destination and two full-byte source registers.
pub fn fmt23x(op: u8, aa: u8, bb: u8, cc: u8) -> Vec<u16> {
    vec![
        op as u16 | ((aa as u16) << 8),
        (bb as u16) | ((cc as u16) << 8),
    ]
}

/// Encode a destination, a source and a signed 8-bit literal.
pub fn fmt22b(op: u8, aa: u8, bb: u8, lit: i8) -> Vec<u16> {
    vec![
        op as u16 | ((aa as u16) << 8),
        (bb as u16) | (((lit as u8) as u16) << 8),
    ]
}

/// Encode two nibble registers and a 16-bit value (offset, literal or
/// pool index; formats `22t`, `22s`, `22c`).
pub fn fmt22t(op: u8, a: u8, b: u8, value: u16) -> Vec<u16> {
    debug_assert!(a < 16 && b < 16);
    vec![
        op as u16 | ((a as u16) << 8) | ((b as u16) << 12),
        value,
    ]
}

/// Encode a signed 32-bit branch offset.
pub fn fmt30t(op: u8, off: i32) -> Vec<u16> {
    let off = off as u32;
    vec![op as u16, off as u16, (off >> 16) as u16]
}

/// Encode two 16-bit registers.
pub fn fmt32x(op: u8, aaaa: u16, bbbb: u16) -> Vec<u16> {
    vec![op as u16, aaaa, bbbb]
}

/// Encode a register and a full 32-bit value (literal, offset or index).
pub fn fmt31i(op: u8, aa: u8, value: u32) -> Vec<u16> {
    vec![
        op as u16 | ((aa as u16) << 8),
        value as u16,
        (value >> 16) as u16,
    ]
}

/// Encode an invoke with up to five single registers.
pub fn fmt35c(op: u8, index: u16, args: &[u8]) -> Vec<u16> {
    debug_assert!(args.len() <= 5);
    let g = if args.len() == 5 { args[4] as u16 } else { 0 };
    let word0 = op as u16 | ((args.len() as u16) << 12) | (g << 8);
    let mut word2 = 0u16;
    for (i, &reg) in args.iter().take(4).enumerate() {
        debug_assert!(reg < 16);
        word2 |= (reg as u16) << (4 * i);
    }
    vec![word0, index, word2]
}

/// Encode a range invoke: `count` registers starting at `first`.
pub fn fmt3rc(op: u8, index: u16, first: u16, count: u8) -> Vec<u16> {
    vec![op as u16 | ((count as u16) << 8), index, first]
}

/// Encode a register and a 64-bit literal.
pub fn fmt51l(op: u8, aa: u8, lit: u64) -> Vec<u16> {
    vec![
        op as u16 | ((aa as u16) << 8),
        lit as u16,
        (lit >> 16) as u16,
        (lit >> 32) as u16,
        (lit >> 48) as u16,
    ]
}

/// Encode an out-of-line packed-switch table.
pub fn packed_switch_payload(first_key: i32, targets: &[i32]) -> Vec<u16> {
    let mut words = vec![
        (crate::opcodes::PACKED_SWITCH_PAYLOAD as u16) << 8,
        targets.len() as u16,
        first_key as u16,
        ((first_key as u32) >> 16) as u16,
    ];
    for &t in targets {
        words.push(t as u16);
        words.push(((t as u32) >> 16) as u16);
    }
    words
}

/// Encode an out-of-line sparse-switch table (keys must be sorted).
pub fn sparse_switch_payload(keys: &[i32], targets: &[i32]) -> Vec<u16> {
    debug_assert_eq!(keys.len(), targets.len());
    debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    let mut words = vec![
        (crate::opcodes::SPARSE_SWITCH_PAYLOAD as u16) << 8,
        keys.len() as u16,
    ];
    for &k in keys {
        words.push(k as u16);
        words.push(((k as u32) >> 16) as u16);
    }
    for &t in targets {
        words.push(t as u16);
        words.push(((t as u32) >> 16) as u16);
    }
    words
}

/// Encode an out-of-line fill-array-data table.
///
/// `element_width` is in bytes; `data` is the raw little-endian element
/// bytes, padded to a whole number of code units.
pub fn fill_array_data_payload(element_width: u16, count: u32, data: &[u8]) -> Vec<u16> {
    let mut words = vec![
        (crate::opcodes::FILL_ARRAY_DATA_PAYLOAD as u16) << 8,
        element_width,
        count as u16,
        (count >> 16) as u16,
    ];
    let mut iter = data.chunks(2);
    for chunk in &mut iter {
        let lo = chunk[0] as u16;
        let hi = if chunk.len() > 1 { chunk[1] as u16 } else { 0 };
        words.push(lo | (hi << 8));
    }
    words
}

/// Builder for one method.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    shorty: String,
    access_flags: u32,
    registers_size: u16,
    ins_size: u16,
    outs_size: u16,
    code: Vec<u16>,
    tries: Vec<(u32, u32, Vec<(Option<String>, u32)>)>,
}

impl MethodBuilder {
    /// New method with the given name, shorty and access flags.
    pub fn new(name: &str, shorty: &str, access_flags: u32) -> Self {
        Self {
            name: name.to_string(),
            shorty: shorty.to_string(),
            access_flags,
            registers_size: 0,
            ins_size: 0,
            outs_size: 0,
            code: Vec::new(),
            tries: Vec::new(),
        }
    }

    /// Set the register window layout.
    pub fn regs(mut self, registers: u16, ins: u16, outs: u16) -> Self {
        self.registers_size = registers;
        self.ins_size = ins;
        self.outs_size = outs;
        self
    }

    /// Append encoded instructions.
    pub fn code(mut self, words: Vec<u16>) -> Self {
        self.code.extend(words);
        self
    }

    /// Add a guarded range. Handlers are `(catch type name, handler pc)`
    /// pairs; `None` catches everything. Inner ranges must be added
    /// before the ranges that enclose them.
    pub fn guarded(mut self, start_pc: u32, insn_count: u32,
                   handlers: Vec<(Option<&str>, u32)>) -> Self {
        self.tries.push((
            start_pc,
            insn_count,
            handlers
                .into_iter()
                .map(|(t, pc)| (t.map(str::to_string), pc))
                .collect(),
        ));
        self
    }
}

/// Builder for one class.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    access_flags: u32,
    fields: Vec<(String, String, u32)>,
    methods: Vec<MethodBuilder>,
}

impl ClassBuilder {
    /// New class extending `superclass` (virtually always `core/Object`).
    pub fn new(name: &str, superclass: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            interfaces: Vec::new(),
            access_flags: flags::ACC_PUBLIC,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Replace the access flags.
    pub fn flags(mut self, access_flags: u32) -> Self {
        self.access_flags = access_flags;
        self
    }

    /// Declare an implemented interface.
    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    /// Declare a field (static when `ACC_STATIC` is set).
    pub fn field(mut self, name: &str, type_name: &str, access_flags: u32) -> Self {
        self.fields
            .push((name.to_string(), type_name.to_string(), access_flags));
        self
    }

    /// Declare a method.
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }
}

/// Builder for a whole code unit.
#[derive(Debug, Default)]
pub struct UnitBuilder {
    strings: Vec<Arc<str>>,
    string_map: HashMap<String, u32>,
    type_names: Vec<u32>,
    type_map: HashMap<String, u32>,
    protos: Vec<u32>,
    proto_map: HashMap<String, u32>,
    method_refs: Vec<MethodRefItem>,
    method_ref_map: HashMap<(u32, u32, u32), u32>,
    field_refs: Vec<FieldRefItem>,
    field_ref_map: HashMap<(u32, u32, u32), u32>,
    classes: Vec<ClassItem>,
}

impl UnitBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its pool index.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.string_map.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(Arc::from(s));
        self.string_map.insert(s.to_string(), idx);
        idx
    }

    /// Intern a type name, returning its type-pool index.
    pub fn type_idx(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.type_map.get(name) {
            return idx;
        }
        let s = self.intern(name);
        let idx = self.type_names.len() as u32;
        self.type_names.push(s);
        self.type_map.insert(name.to_string(), idx);
        idx
    }

    /// Intern a shorty, returning its proto-pool index.
    pub fn proto_idx(&mut self, shorty: &str) -> u32 {
        if let Some(&idx) = self.proto_map.get(shorty) {
            return idx;
        }
        let s = self.intern(shorty);
        let idx = self.protos.len() as u32;
        self.protos.push(s);
        self.proto_map.insert(shorty.to_string(), idx);
        idx
    }

    /// Add (or find) a method reference, returning its pool index.
    pub fn method_ref(&mut self, owner: &str, name: &str, shorty: &str) -> u16 {
        let key = (
            self.type_idx(owner),
            self.intern(name),
            self.proto_idx(shorty),
        );
        if let Some(&idx) = self.method_ref_map.get(&key) {
            return idx as u16;
        }
        let idx = self.method_refs.len() as u32;
        self.method_refs.push(MethodRefItem {
            owner: key.0,
            name: key.1,
            proto: key.2,
        });
        self.method_ref_map.insert(key, idx);
        idx as u16
    }

    /// Add (or find) a field reference, returning its pool index.
    pub fn field_ref(&mut self, owner: &str, name: &str, type_name: &str) -> u16 {
        let key = (
            self.type_idx(owner),
            self.intern(name),
            self.type_idx(type_name),
        );
        if let Some(&idx) = self.field_ref_map.get(&key) {
            return idx as u16;
        }
        let idx = self.field_refs.len() as u32;
        self.field_refs.push(FieldRefItem {
            owner: key.0,
            name: key.1,
            type_name: key.2,
        });
        self.field_ref_map.insert(key, idx);
        idx as u16
    }

    /// Add a class definition.
    pub fn add_class(&mut self, class: ClassBuilder) {
        let name = self.type_idx(&class.name);
        let superclass = class.superclass.as_deref().map(|s| self.type_idx(s));
        let interfaces = class
            .interfaces
            .iter()
            .map(|s| self.type_idx(s))
            .collect::<Vec<_>>();

        let mut static_fields = Vec::new();
        let mut instance_fields = Vec::new();
        for (fname, ftype, fflags) in &class.fields {
            let item = FieldItem {
                name: self.intern(fname),
                type_name: self.type_idx(ftype),
                access_flags: *fflags,
            };
            if fflags & flags::ACC_STATIC != 0 {
                static_fields.push(item);
            } else {
                instance_fields.push(item);
            }
        }

        let mut methods = Vec::new();
        for m in &class.methods {
            let tries = m
                .tries
                .iter()
                .map(|(start, count, handlers)| TryItem {
                    start_pc: *start,
                    insn_count: *count,
                    handlers: handlers
                        .iter()
                        .map(|(t, pc)| CatchHandler {
                            catch_type: t.as_deref().map(|n| self.type_idx(n)),
                            handler_pc: *pc,
                        })
                        .collect(),
                })
                .collect();
            let body = if m.access_flags & (flags::ACC_NATIVE | flags::ACC_ABSTRACT) != 0 {
                None
            } else {
                Some(Arc::new(MethodBody {
                    registers_size: m.registers_size,
                    ins_size: m.ins_size,
                    outs_size: m.outs_size,
                    insns: m.code.clone().into(),
                    tries,
                }))
            };
            methods.push(MethodItem {
                name: self.intern(&m.name),
                proto: self.proto_idx(&m.shorty),
                access_flags: m.access_flags,
                body,
            });
        }

        self.classes.push(ClassItem {
            name,
            superclass,
            interfaces,
            access_flags: class.access_flags,
            static_fields,
            instance_fields,
            methods,
        });
    }

    /// Validate and produce the immutable unit.
    pub fn build(self) -> Result<CodeUnit, VmError> {
        let unit = CodeUnit {
            strings: self.strings,
            type_names: self.type_names,
            protos: self.protos,
            method_refs: self.method_refs,
            field_refs: self.field_refs,
            classes: self.classes,
        };
        validate(&unit)?;
        Ok(unit)
    }
}

/// Structural checks normally guaranteed by the loader/verifier: the
/// instruction stream must decode to a consistent sequence of defined
/// opcodes, and windows must be large enough for their ins.
fn validate(unit: &CodeUnit) -> Result<(), VmError> {
    for class in &unit.classes {
        for method in &class.methods {
            let Some(body) = &method.body else { continue };
            if body.ins_size > body.registers_size {
                return Err(VmError::InvalidUnit(format!(
                    "method {} has ins {} > registers {}",
                    unit.string(method.name),
                    body.ins_size,
                    body.registers_size
                )));
            }
            let mut pc = 0usize;
            while pc < body.insns.len() {
                let word = body.insns[pc];
                let op = (word & 0xff) as u8;
                // Out-of-line payload table: skip by its own header
                if op == crate::opcodes::OP_NOP && (word >> 8) != 0 {
                    pc += payload_len(&body.insns[pc..]).ok_or_else(|| {
                        VmError::InvalidUnit("truncated payload table".into())
                    })?;
                    continue;
                }
                let width = insn_width(op);
                if width == 0 {
                    return Err(VmError::InvalidUnit(format!(
                        "undefined opcode 0x{op:02x} at pc {pc}"
                    )));
                }
                pc += width;
            }
            if pc != body.insns.len() {
                return Err(VmError::InvalidUnit(
                    "instruction stream overruns method end".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Length in code units of the payload table starting at `words[0]`,
/// or None if truncated.
pub fn payload_len(words: &[u16]) -> Option<usize> {
    let ident = (words[0] >> 8) as u8;
    let len = match ident {
        crate::opcodes::PACKED_SWITCH_PAYLOAD => {
            let size = *words.get(1)? as usize;
            4 + size * 2
        }
        crate::opcodes::SPARSE_SWITCH_PAYLOAD => {
            let size = *words.get(1)? as usize;
            2 + size * 4
        }
        crate::opcodes::FILL_ARRAY_DATA_PAYLOAD => {
            let width = *words.get(1)? as usize;
            let count =
                (*words.get(2)? as usize) | ((*words.get(3)? as usize) << 16);
            4 + (width * count).div_ceil(2)
        }
        _ => return None,
    };
    (len <= words.len()).then_some(len)
}
