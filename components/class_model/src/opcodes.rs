//! Instruction set definition
//!
//! Bytecode is a stream of 16-bit code units. The low byte of the first
//! unit is the opcode; operands are packed into the remaining nibbles,
//! bytes, and extension words depending on the instruction format.
//!
//! Format naming follows the `[units][registers][kind]` convention:
//! `22x` = two units, two registers; `21c` = two units, one register,
//! one constant-pool index; `35c` = three units, up to five registers,
//! one pool index; and so on. Switch and array-data payload tables are
//! stored out of line and addressed by 32-bit branch offsets.

/// No operation (also carries out-of-line payload tables, see
/// [`PACKED_SWITCH_PAYLOAD`] and friends in the high byte).
pub const OP_NOP: u8 = 0x00;

/// Register move, nibble registers.
pub const OP_MOVE: u8 = 0x01;
/// Register move, 8-bit destination, 16-bit source.
pub const OP_MOVE_FROM16: u8 = 0x02;
/// Register move, 16-bit registers.
pub const OP_MOVE_16: u8 = 0x03;
/// Wide register-pair move.
pub const OP_MOVE_WIDE: u8 = 0x04;
/// Wide move, 8/16-bit registers.
pub const OP_MOVE_WIDE_FROM16: u8 = 0x05;
/// Wide move, 16-bit registers.
pub const OP_MOVE_WIDE_16: u8 = 0x06;
/// Object move, nibble registers.
pub const OP_MOVE_OBJECT: u8 = 0x07;
/// Object move, 8/16-bit registers.
pub const OP_MOVE_OBJECT_FROM16: u8 = 0x08;
/// Object move, 16-bit registers.
pub const OP_MOVE_OBJECT_16: u8 = 0x09;

/// Copy the latest invoke's 32-bit result.
pub const OP_MOVE_RESULT: u8 = 0x0a;
/// Copy the latest invoke's 64-bit result.
pub const OP_MOVE_RESULT_WIDE: u8 = 0x0b;
/// Copy the latest invoke's reference result.
pub const OP_MOVE_RESULT_OBJECT: u8 = 0x0c;
/// Copy the caught exception into a register (first handler insn).
pub const OP_MOVE_EXCEPTION: u8 = 0x0d;

/// Return from a void method.
pub const OP_RETURN_VOID: u8 = 0x0e;
/// Return a 32-bit value.
pub const OP_RETURN: u8 = 0x0f;
/// Return a 64-bit value.
pub const OP_RETURN_WIDE: u8 = 0x10;
/// Return a reference.
pub const OP_RETURN_OBJECT: u8 = 0x11;

/// Load a signed 4-bit literal.
pub const OP_CONST_4: u8 = 0x12;
/// Load a sign-extended 16-bit literal.
pub const OP_CONST_16: u8 = 0x13;
/// Load a full 32-bit literal.
pub const OP_CONST: u8 = 0x14;
/// Load a 16-bit literal shifted into the high half-word.
pub const OP_CONST_HIGH16: u8 = 0x15;
/// Load a sign-extended 16-bit literal into a register pair.
pub const OP_CONST_WIDE_16: u8 = 0x16;
/// Load a sign-extended 32-bit literal into a register pair.
pub const OP_CONST_WIDE_32: u8 = 0x17;
/// Load a full 64-bit literal.
pub const OP_CONST_WIDE: u8 = 0x18;
/// Load a 16-bit literal shifted into the top of a register pair.
pub const OP_CONST_WIDE_HIGH16: u8 = 0x19;
/// Load an interned string by 16-bit pool index.
pub const OP_CONST_STRING: u8 = 0x1a;
/// Load an interned string by 32-bit pool index.
pub const OP_CONST_STRING_JUMBO: u8 = 0x1b;
/// Load a class object by type index.
pub const OP_CONST_CLASS: u8 = 0x1c;

/// Enter an object's monitor.
pub const OP_MONITOR_ENTER: u8 = 0x1d;
/// Exit an object's monitor.
pub const OP_MONITOR_EXIT: u8 = 0x1e;

/// Throw ClassCast unless the reference is assignable to the type.
pub const OP_CHECK_CAST: u8 = 0x1f;
/// Test assignability, writing 0/1.
pub const OP_INSTANCE_OF: u8 = 0x20;
/// Read an array's length.
pub const OP_ARRAY_LENGTH: u8 = 0x21;

/// Allocate an instance of a resolved class.
pub const OP_NEW_INSTANCE: u8 = 0x22;
/// Allocate an array of a resolved element type.
pub const OP_NEW_ARRAY: u8 = 0x23;
/// Bulk-initialize a primitive array from an out-of-line table.
pub const OP_FILL_ARRAY_DATA: u8 = 0x26;

/// Throw the reference in the named register.
pub const OP_THROW: u8 = 0x27;
/// Unconditional branch, signed 8-bit offset.
pub const OP_GOTO: u8 = 0x28;
/// Unconditional branch, signed 16-bit offset.
pub const OP_GOTO_16: u8 = 0x29;
/// Unconditional branch, signed 32-bit offset.
pub const OP_GOTO_32: u8 = 0x2a;

/// Jump table keyed by consecutive values.
pub const OP_PACKED_SWITCH: u8 = 0x2b;
/// Jump table keyed by sparse sorted values.
pub const OP_SPARSE_SWITCH: u8 = 0x2c;

/// Float compare, NaN orders less-than.
pub const OP_CMPL_FLOAT: u8 = 0x2d;
/// Float compare, NaN orders greater-than.
pub const OP_CMPG_FLOAT: u8 = 0x2e;
/// Double compare, NaN orders less-than.
pub const OP_CMPL_DOUBLE: u8 = 0x2f;
/// Double compare, NaN orders greater-than.
pub const OP_CMPG_DOUBLE: u8 = 0x30;
/// 64-bit integer three-way compare.
pub const OP_CMP_LONG: u8 = 0x31;

/// Branch if equal.
pub const OP_IF_EQ: u8 = 0x32;
/// Branch if not equal.
pub const OP_IF_NE: u8 = 0x33;
/// Branch if less-than.
pub const OP_IF_LT: u8 = 0x34;
/// Branch if greater-or-equal.
pub const OP_IF_GE: u8 = 0x35;
/// Branch if greater-than.
pub const OP_IF_GT: u8 = 0x36;
/// Branch if less-or-equal.
pub const OP_IF_LE: u8 = 0x37;
/// Branch if zero / null.
pub const OP_IF_EQZ: u8 = 0x38;
/// Branch if nonzero / non-null.
pub const OP_IF_NEZ: u8 = 0x39;
/// Branch if negative.
pub const OP_IF_LTZ: u8 = 0x3a;
/// Branch if non-negative.
pub const OP_IF_GEZ: u8 = 0x3b;
/// Branch if positive.
pub const OP_IF_GTZ: u8 = 0x3c;
/// Branch if non-positive.
pub const OP_IF_LEZ: u8 = 0x3d;

/// Array element load, 32-bit.
pub const OP_AGET: u8 = 0x44;
/// Array element load, 64-bit.
pub const OP_AGET_WIDE: u8 = 0x45;
/// Array element load, reference.
pub const OP_AGET_OBJECT: u8 = 0x46;
/// Array element load, boolean.
pub const OP_AGET_BOOLEAN: u8 = 0x47;
/// Array element load, signed byte.
pub const OP_AGET_BYTE: u8 = 0x48;
/// Array element load, unsigned 16-bit char.
pub const OP_AGET_CHAR: u8 = 0x49;
/// Array element load, signed short.
pub const OP_AGET_SHORT: u8 = 0x4a;
/// Array element store, 32-bit.
pub const OP_APUT: u8 = 0x4b;
/// Array element store, 64-bit.
pub const OP_APUT_WIDE: u8 = 0x4c;
/// Array element store, reference (type-checked).
pub const OP_APUT_OBJECT: u8 = 0x4d;
/// Array element store, boolean.
pub const OP_APUT_BOOLEAN: u8 = 0x4e;
/// Array element store, byte.
pub const OP_APUT_BYTE: u8 = 0x4f;
/// Array element store, char.
pub const OP_APUT_CHAR: u8 = 0x50;
/// Array element store, short.
pub const OP_APUT_SHORT: u8 = 0x51;

/// Instance field load, 32-bit.
pub const OP_IGET: u8 = 0x52;
/// Instance field load, 64-bit.
pub const OP_IGET_WIDE: u8 = 0x53;
/// Instance field load, reference.
pub const OP_IGET_OBJECT: u8 = 0x54;
/// Instance field load, boolean.
pub const OP_IGET_BOOLEAN: u8 = 0x55;
/// Instance field load, byte.
pub const OP_IGET_BYTE: u8 = 0x56;
/// Instance field load, char.
pub const OP_IGET_CHAR: u8 = 0x57;
/// Instance field load, short.
pub const OP_IGET_SHORT: u8 = 0x58;
/// Instance field store, 32-bit.
pub const OP_IPUT: u8 = 0x59;
/// Instance field store, 64-bit.
pub const OP_IPUT_WIDE: u8 = 0x5a;
/// Instance field store, reference.
pub const OP_IPUT_OBJECT: u8 = 0x5b;
/// Instance field store, boolean.
pub const OP_IPUT_BOOLEAN: u8 = 0x5c;
/// Instance field store, byte.
pub const OP_IPUT_BYTE: u8 = 0x5d;
/// Instance field store, char.
pub const OP_IPUT_CHAR: u8 = 0x5e;
/// Instance field store, short.
pub const OP_IPUT_SHORT: u8 = 0x5f;

/// Static field load, 32-bit.
pub const OP_SGET: u8 = 0x60;
/// Static field load, 64-bit.
pub const OP_SGET_WIDE: u8 = 0x61;
/// Static field load, reference.
pub const OP_SGET_OBJECT: u8 = 0x62;
/// Static field load, boolean.
pub const OP_SGET_BOOLEAN: u8 = 0x63;
/// Static field load, byte.
pub const OP_SGET_BYTE: u8 = 0x64;
/// Static field load, char.
pub const OP_SGET_CHAR: u8 = 0x65;
/// Static field load, short.
pub const OP_SGET_SHORT: u8 = 0x66;
/// Static field store, 32-bit.
pub const OP_SPUT: u8 = 0x67;
/// Static field store, 64-bit.
pub const OP_SPUT_WIDE: u8 = 0x68;
/// Static field store, reference.
pub const OP_SPUT_OBJECT: u8 = 0x69;
/// Static field store, boolean.
pub const OP_SPUT_BOOLEAN: u8 = 0x6a;
/// Static field store, byte.
pub const OP_SPUT_BYTE: u8 = 0x6b;
/// Static field store, char.
pub const OP_SPUT_CHAR: u8 = 0x6c;
/// Static field store, short.
pub const OP_SPUT_SHORT: u8 = 0x6d;

/// Virtual dispatch through the receiver's vtable.
pub const OP_INVOKE_VIRTUAL: u8 = 0x6e;
/// Superclass dispatch from the declaring class.
pub const OP_INVOKE_SUPER: u8 = 0x6f;
/// Direct (private/constructor) dispatch.
pub const OP_INVOKE_DIRECT: u8 = 0x70;
/// Static dispatch (initializes the class first).
pub const OP_INVOKE_STATIC: u8 = 0x71;
/// Interface dispatch by name/signature search.
pub const OP_INVOKE_INTERFACE: u8 = 0x72;
/// Virtual dispatch, contiguous register range.
pub const OP_INVOKE_VIRTUAL_RANGE: u8 = 0x74;
/// Super dispatch, register range.
pub const OP_INVOKE_SUPER_RANGE: u8 = 0x75;
/// Direct dispatch, register range.
pub const OP_INVOKE_DIRECT_RANGE: u8 = 0x76;
/// Static dispatch, register range.
pub const OP_INVOKE_STATIC_RANGE: u8 = 0x77;
/// Interface dispatch, register range.
pub const OP_INVOKE_INTERFACE_RANGE: u8 = 0x78;

/// Arithmetic negate, 32-bit.
pub const OP_NEG_INT: u8 = 0x7b;
/// Bitwise complement, 32-bit.
pub const OP_NOT_INT: u8 = 0x7c;
/// Arithmetic negate, 64-bit.
pub const OP_NEG_LONG: u8 = 0x7d;
/// Bitwise complement, 64-bit.
pub const OP_NOT_LONG: u8 = 0x7e;
/// Float negate.
pub const OP_NEG_FLOAT: u8 = 0x7f;
/// Double negate.
pub const OP_NEG_DOUBLE: u8 = 0x80;
/// Sign-extend int to long.
pub const OP_INT_TO_LONG: u8 = 0x81;
/// Convert int to float.
pub const OP_INT_TO_FLOAT: u8 = 0x82;
/// Convert int to double.
pub const OP_INT_TO_DOUBLE: u8 = 0x83;
/// Truncate long to int.
pub const OP_LONG_TO_INT: u8 = 0x84;
/// Convert long to float.
pub const OP_LONG_TO_FLOAT: u8 = 0x85;
/// Convert long to double.
pub const OP_LONG_TO_DOUBLE: u8 = 0x86;
/// Convert float to int (truncating, NaN to 0, saturating).
pub const OP_FLOAT_TO_INT: u8 = 0x87;
/// Convert float to long (truncating, NaN to 0, saturating).
pub const OP_FLOAT_TO_LONG: u8 = 0x88;
/// Widen float to double.
pub const OP_FLOAT_TO_DOUBLE: u8 = 0x89;
/// Convert double to int (truncating, NaN to 0, saturating).
pub const OP_DOUBLE_TO_INT: u8 = 0x8a;
/// Convert double to long (truncating, NaN to 0, saturating).
pub const OP_DOUBLE_TO_LONG: u8 = 0x8b;
/// Narrow double to float.
pub const OP_DOUBLE_TO_FLOAT: u8 = 0x8c;
/// Truncate int to signed byte.
pub const OP_INT_TO_BYTE: u8 = 0x8d;
/// Truncate int to unsigned 16-bit char.
pub const OP_INT_TO_CHAR: u8 = 0x8e;
/// Truncate int to signed short.
pub const OP_INT_TO_SHORT: u8 = 0x8f;

/// 32-bit add.
pub const OP_ADD_INT: u8 = 0x90;
/// 32-bit subtract.
pub const OP_SUB_INT: u8 = 0x91;
/// 32-bit multiply.
pub const OP_MUL_INT: u8 = 0x92;
/// 32-bit divide (zero divisor raises arithmetic fault).
pub const OP_DIV_INT: u8 = 0x93;
/// 32-bit remainder.
pub const OP_REM_INT: u8 = 0x94;
/// 32-bit and.
pub const OP_AND_INT: u8 = 0x95;
/// 32-bit or.
pub const OP_OR_INT: u8 = 0x96;
/// 32-bit xor.
pub const OP_XOR_INT: u8 = 0x97;
/// 32-bit shift left (count masked to 5 bits).
pub const OP_SHL_INT: u8 = 0x98;
/// 32-bit arithmetic shift right.
pub const OP_SHR_INT: u8 = 0x99;
/// 32-bit logical shift right.
pub const OP_USHR_INT: u8 = 0x9a;
/// 64-bit add.
pub const OP_ADD_LONG: u8 = 0x9b;
/// 64-bit subtract.
pub const OP_SUB_LONG: u8 = 0x9c;
/// 64-bit multiply.
pub const OP_MUL_LONG: u8 = 0x9d;
/// 64-bit divide.
pub const OP_DIV_LONG: u8 = 0x9e;
/// 64-bit remainder.
pub const OP_REM_LONG: u8 = 0x9f;
/// 64-bit and.
pub const OP_AND_LONG: u8 = 0xa0;
/// 64-bit or.
pub const OP_OR_LONG: u8 = 0xa1;
/// 64-bit xor.
pub const OP_XOR_LONG: u8 = 0xa2;
/// 64-bit shift left (count masked to 6 bits).
pub const OP_SHL_LONG: u8 = 0xa3;
/// 64-bit arithmetic shift right.
pub const OP_SHR_LONG: u8 = 0xa4;
/// 64-bit logical shift right.
pub const OP_USHR_LONG: u8 = 0xa5;
/// Float add.
pub const OP_ADD_FLOAT: u8 = 0xa6;
/// Float subtract.
pub const OP_SUB_FLOAT: u8 = 0xa7;
/// Float multiply.
pub const OP_MUL_FLOAT: u8 = 0xa8;
/// Float divide.
pub const OP_DIV_FLOAT: u8 = 0xa9;
/// Float remainder (IEEE remainder with truncated quotient).
pub const OP_REM_FLOAT: u8 = 0xaa;
/// Double add.
pub const OP_ADD_DOUBLE: u8 = 0xab;
/// Double subtract.
pub const OP_SUB_DOUBLE: u8 = 0xac;
/// Double multiply.
pub const OP_MUL_DOUBLE: u8 = 0xad;
/// Double divide.
pub const OP_DIV_DOUBLE: u8 = 0xae;
/// Double remainder.
pub const OP_REM_DOUBLE: u8 = 0xaf;

/// Two-address 32-bit add (first opcode of the /2addr block; the whole
/// block mirrors 0x90..=0xaf with source and destination folded).
pub const OP_ADD_INT_2ADDR: u8 = 0xb0;
/// Two-address 32-bit subtract.
pub const OP_SUB_INT_2ADDR: u8 = 0xb1;
/// Two-address 32-bit multiply.
pub const OP_MUL_INT_2ADDR: u8 = 0xb2;
/// Two-address 32-bit divide.
pub const OP_DIV_INT_2ADDR: u8 = 0xb3;
/// Last opcode of the /2addr block.
pub const OP_REM_DOUBLE_2ADDR: u8 = 0xcf;

/// Add with sign-extended 16-bit literal.
pub const OP_ADD_INT_LIT16: u8 = 0xd0;
/// Reverse subtract (literal minus register).
pub const OP_RSUB_INT: u8 = 0xd1;
/// Multiply with 16-bit literal.
pub const OP_MUL_INT_LIT16: u8 = 0xd2;
/// Divide with 16-bit literal.
pub const OP_DIV_INT_LIT16: u8 = 0xd3;
/// Remainder with 16-bit literal.
pub const OP_REM_INT_LIT16: u8 = 0xd4;
/// And with 16-bit literal.
pub const OP_AND_INT_LIT16: u8 = 0xd5;
/// Or with 16-bit literal.
pub const OP_OR_INT_LIT16: u8 = 0xd6;
/// Xor with 16-bit literal.
pub const OP_XOR_INT_LIT16: u8 = 0xd7;
/// Add with sign-extended 8-bit literal.
pub const OP_ADD_INT_LIT8: u8 = 0xd8;
/// Reverse subtract with 8-bit literal.
pub const OP_RSUB_INT_LIT8: u8 = 0xd9;
/// Multiply with 8-bit literal.
pub const OP_MUL_INT_LIT8: u8 = 0xda;
/// Divide with 8-bit literal.
pub const OP_DIV_INT_LIT8: u8 = 0xdb;
/// Remainder with 8-bit literal.
pub const OP_REM_INT_LIT8: u8 = 0xdc;
/// And with 8-bit literal.
pub const OP_AND_INT_LIT8: u8 = 0xdd;
/// Or with 8-bit literal.
pub const OP_OR_INT_LIT8: u8 = 0xde;
/// Xor with 8-bit literal.
pub const OP_XOR_INT_LIT8: u8 = 0xdf;
/// Shift left with 8-bit literal.
pub const OP_SHL_INT_LIT8: u8 = 0xe0;
/// Arithmetic shift right with 8-bit literal.
pub const OP_SHR_INT_LIT8: u8 = 0xe1;
/// Logical shift right with 8-bit literal.
pub const OP_USHR_INT_LIT8: u8 = 0xe2;

/// Reserved trap opcode used by the debugger's breakpoint table.
///
/// Never emitted by the builder; the interpreter consults the patch
/// table to recover the replaced opcode and re-dispatch.
pub const OP_BREAKPOINT: u8 = 0xec;

/// High byte marking an out-of-line packed-switch table (`NOP` low byte).
pub const PACKED_SWITCH_PAYLOAD: u8 = 0x01;
/// High byte marking a sparse-switch table.
pub const SPARSE_SWITCH_PAYLOAD: u8 = 0x02;
/// High byte marking a fill-array-data table.
pub const FILL_ARRAY_DATA_PAYLOAD: u8 = 0x03;

/// Width in 16-bit code units of the instruction starting with `op`,
/// or 0 for opcodes this ISA does not define.
pub fn insn_width(op: u8) -> usize {
    match op {
        0x00..=0x01 => 1,
        0x02 => 2,
        0x03 => 3,
        0x04 => 1,
        0x05 => 2,
        0x06 => 3,
        0x07 => 1,
        0x08 => 2,
        0x09 => 3,
        0x0a..=0x12 => 1,
        0x13 => 2,
        0x14 => 3,
        0x15..=0x16 => 2,
        0x17 => 3,
        0x18 => 5,
        0x19..=0x1a => 2,
        0x1b => 3,
        0x1c => 2,
        0x1d..=0x1e => 1,
        0x1f => 2,
        0x20 => 2,
        0x21 => 1,
        0x22..=0x23 => 2,
        0x26 => 3,
        0x27..=0x28 => 1,
        0x29 => 2,
        0x2a..=0x2c => 3,
        0x2d..=0x31 => 2,
        0x32..=0x3d => 2,
        0x44..=0x6d => 2,
        0x6e..=0x72 | 0x74..=0x78 => 3,
        0x7b..=0x8f => 1,
        0x90..=0xaf => 2,
        0xb0..=0xcf => 1,
        0xd0..=0xe2 => 2,
        OP_BREAKPOINT => 1,
        _ => 0,
    }
}

/// Human-readable mnemonic for trace logging and the debugger.
pub fn insn_name(op: u8) -> &'static str {
    match op {
        OP_NOP => "nop",
        OP_MOVE => "move",
        OP_MOVE_FROM16 => "move/from16",
        OP_MOVE_16 => "move/16",
        OP_MOVE_WIDE => "move-wide",
        OP_MOVE_WIDE_FROM16 => "move-wide/from16",
        OP_MOVE_WIDE_16 => "move-wide/16",
        OP_MOVE_OBJECT => "move-object",
        OP_MOVE_OBJECT_FROM16 => "move-object/from16",
        OP_MOVE_OBJECT_16 => "move-object/16",
        OP_MOVE_RESULT => "move-result",
        OP_MOVE_RESULT_WIDE => "move-result-wide",
        OP_MOVE_RESULT_OBJECT => "move-result-object",
        OP_MOVE_EXCEPTION => "move-exception",
        OP_RETURN_VOID => "return-void",
        OP_RETURN => "return",
        OP_RETURN_WIDE => "return-wide",
        OP_RETURN_OBJECT => "return-object",
        OP_CONST_4 => "const/4",
        OP_CONST_16 => "const/16",
        OP_CONST => "const",
        OP_CONST_HIGH16 => "const/high16",
        OP_CONST_WIDE_16 => "const-wide/16",
        OP_CONST_WIDE_32 => "const-wide/32",
        OP_CONST_WIDE => "const-wide",
        OP_CONST_WIDE_HIGH16 => "const-wide/high16",
        OP_CONST_STRING => "const-string",
        OP_CONST_STRING_JUMBO => "const-string/jumbo",
        OP_CONST_CLASS => "const-class",
        OP_MONITOR_ENTER => "monitor-enter",
        OP_MONITOR_EXIT => "monitor-exit",
        OP_CHECK_CAST => "check-cast",
        OP_INSTANCE_OF => "instance-of",
        OP_ARRAY_LENGTH => "array-length",
        OP_NEW_INSTANCE => "new-instance",
        OP_NEW_ARRAY => "new-array",
        OP_FILL_ARRAY_DATA => "fill-array-data",
        OP_THROW => "throw",
        OP_GOTO => "goto",
        OP_GOTO_16 => "goto/16",
        OP_GOTO_32 => "goto/32",
        OP_PACKED_SWITCH => "packed-switch",
        OP_SPARSE_SWITCH => "sparse-switch",
        OP_CMPL_FLOAT => "cmpl-float",
        OP_CMPG_FLOAT => "cmpg-float",
        OP_CMPL_DOUBLE => "cmpl-double",
        OP_CMPG_DOUBLE => "cmpg-double",
        OP_CMP_LONG => "cmp-long",
        OP_IF_EQ => "if-eq",
        OP_IF_NE => "if-ne",
        OP_IF_LT => "if-lt",
        OP_IF_GE => "if-ge",
        OP_IF_GT => "if-gt",
        OP_IF_LE => "if-le",
        OP_IF_EQZ => "if-eqz",
        OP_IF_NEZ => "if-nez",
        OP_IF_LTZ => "if-ltz",
        OP_IF_GEZ => "if-gez",
        OP_IF_GTZ => "if-gtz",
        OP_IF_LEZ => "if-lez",
        OP_AGET => "aget",
        OP_AGET_WIDE => "aget-wide",
        OP_AGET_OBJECT => "aget-object",
        OP_AGET_BOOLEAN => "aget-boolean",
        OP_AGET_BYTE => "aget-byte",
        OP_AGET_CHAR => "aget-char",
        OP_AGET_SHORT => "aget-short",
        OP_APUT => "aput",
        OP_APUT_WIDE => "aput-wide",
        OP_APUT_OBJECT => "aput-object",
        OP_APUT_BOOLEAN => "aput-boolean",
        OP_APUT_BYTE => "aput-byte",
        OP_APUT_CHAR => "aput-char",
        OP_APUT_SHORT => "aput-short",
        OP_IGET => "iget",
        OP_IGET_WIDE => "iget-wide",
        OP_IGET_OBJECT => "iget-object",
        OP_IGET_BOOLEAN => "iget-boolean",
        OP_IGET_BYTE => "iget-byte",
        OP_IGET_CHAR => "iget-char",
        OP_IGET_SHORT => "iget-short",
        OP_IPUT => "iput",
        OP_IPUT_WIDE => "iput-wide",
        OP_IPUT_OBJECT => "iput-object",
        OP_IPUT_BOOLEAN => "iput-boolean",
        OP_IPUT_BYTE => "iput-byte",
        OP_IPUT_CHAR => "iput-char",
        OP_IPUT_SHORT => "iput-short",
        OP_SGET => "sget",
        OP_SGET_WIDE => "sget-wide",
        OP_SGET_OBJECT => "sget-object",
        OP_SGET_BOOLEAN => "sget-boolean",
        OP_SGET_BYTE => "sget-byte",
        OP_SGET_CHAR => "sget-char",
        OP_SGET_SHORT => "sget-short",
        OP_SPUT => "sput",
        OP_SPUT_WIDE => "sput-wide",
        OP_SPUT_OBJECT => "sput-object",
        OP_SPUT_BOOLEAN => "sput-boolean",
        OP_SPUT_BYTE => "sput-byte",
        OP_SPUT_CHAR => "sput-char",
        OP_SPUT_SHORT => "sput-short",
        OP_INVOKE_VIRTUAL => "invoke-virtual",
        OP_INVOKE_SUPER => "invoke-super",
        OP_INVOKE_DIRECT => "invoke-direct",
        OP_INVOKE_STATIC => "invoke-static",
        OP_INVOKE_INTERFACE => "invoke-interface",
        OP_INVOKE_VIRTUAL_RANGE => "invoke-virtual/range",
        OP_INVOKE_SUPER_RANGE => "invoke-super/range",
        OP_INVOKE_DIRECT_RANGE => "invoke-direct/range",
        OP_INVOKE_STATIC_RANGE => "invoke-static/range",
        OP_INVOKE_INTERFACE_RANGE => "invoke-interface/range",
        OP_NEG_INT => "neg-int",
        OP_NOT_INT => "not-int",
        OP_NEG_LONG => "neg-long",
        OP_NOT_LONG => "not-long",
        OP_NEG_FLOAT => "neg-float",
        OP_NEG_DOUBLE => "neg-double",
        OP_INT_TO_LONG => "int-to-long",
        OP_INT_TO_FLOAT => "int-to-float",
        OP_INT_TO_DOUBLE => "int-to-double",
        OP_LONG_TO_INT => "long-to-int",
        OP_LONG_TO_FLOAT => "long-to-float",
        OP_LONG_TO_DOUBLE => "long-to-double",
        OP_FLOAT_TO_INT => "float-to-int",
        OP_FLOAT_TO_LONG => "float-to-long",
        OP_FLOAT_TO_DOUBLE => "float-to-double",
        OP_DOUBLE_TO_INT => "double-to-int",
        OP_DOUBLE_TO_LONG => "double-to-long",
        OP_DOUBLE_TO_FLOAT => "double-to-float",
        OP_INT_TO_BYTE => "int-to-byte",
        OP_INT_TO_CHAR => "int-to-char",
        OP_INT_TO_SHORT => "int-to-short",
        0x90..=0xaf => binop_name((op - 0x90) as usize, ""),
        0xb0..=0xcf => binop_name((op - 0xb0) as usize, "/2addr"),
        OP_ADD_INT_LIT16 => "add-int/lit16",
        OP_RSUB_INT => "rsub-int",
        OP_MUL_INT_LIT16 => "mul-int/lit16",
        OP_DIV_INT_LIT16 => "div-int/lit16",
        OP_REM_INT_LIT16 => "rem-int/lit16",
        OP_AND_INT_LIT16 => "and-int/lit16",
        OP_OR_INT_LIT16 => "or-int/lit16",
        OP_XOR_INT_LIT16 => "xor-int/lit16",
        OP_ADD_INT_LIT8 => "add-int/lit8",
        OP_RSUB_INT_LIT8 => "rsub-int/lit8",
        OP_MUL_INT_LIT8 => "mul-int/lit8",
        OP_DIV_INT_LIT8 => "div-int/lit8",
        OP_REM_INT_LIT8 => "rem-int/lit8",
        OP_AND_INT_LIT8 => "and-int/lit8",
        OP_OR_INT_LIT8 => "or-int/lit8",
        OP_XOR_INT_LIT8 => "xor-int/lit8",
        OP_SHL_INT_LIT8 => "shl-int/lit8",
        OP_SHR_INT_LIT8 => "shr-int/lit8",
        OP_USHR_INT_LIT8 => "ushr-int/lit8",
        OP_BREAKPOINT => "breakpoint",
        _ => "unused",
    }
}

fn binop_name(index: usize, suffix: &'static str) -> &'static str {
    const NAMES: [[&str; 2]; 32] = [
        ["add-int", "add-int/2addr"],
        ["sub-int", "sub-int/2addr"],
        ["mul-int", "mul-int/2addr"],
        ["div-int", "div-int/2addr"],
        ["rem-int", "rem-int/2addr"],
        ["and-int", "and-int/2addr"],
        ["or-int", "or-int/2addr"],
        ["xor-int", "xor-int/2addr"],
        ["shl-int", "shl-int/2addr"],
        ["shr-int", "shr-int/2addr"],
        ["ushr-int", "ushr-int/2addr"],
        ["add-long", "add-long/2addr"],
        ["sub-long", "sub-long/2addr"],
        ["mul-long", "mul-long/2addr"],
        ["div-long", "div-long/2addr"],
        ["rem-long", "rem-long/2addr"],
        ["and-long", "and-long/2addr"],
        ["or-long", "or-long/2addr"],
        ["xor-long", "xor-long/2addr"],
        ["shl-long", "shl-long/2addr"],
        ["shr-long", "shr-long/2addr"],
        ["ushr-long", "ushr-long/2addr"],
        ["add-float", "add-float/2addr"],
        ["sub-float", "sub-float/2addr"],
        ["mul-float", "mul-float/2addr"],
        ["div-float", "div-float/2addr"],
        ["rem-float", "rem-float/2addr"],
        ["add-double", "add-double/2addr"],
        ["sub-double", "sub-double/2addr"],
        ["mul-double", "mul-double/2addr"],
        ["div-double", "div-double/2addr"],
        ["rem-double", "rem-double/2addr"],
    ];
    NAMES[index][if suffix.is_empty() { 0 } else { 1 }]
}
