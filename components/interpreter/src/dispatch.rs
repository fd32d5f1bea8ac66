//! Dispatch strategies
//!
//! Both strategies drive the same handler functions and must be
//! indistinguishable in effect; the golden-corpus tests in
//! `tests/integration` run every program under both.
//!
//! - **portable**: one `match` over the opcode byte
//! - **threaded**: a 256-entry function table indexed by opcode; the
//!   per-opcode entry points double as the breakpoint trap's
//!   re-dispatch targets (the trap passes the recorded original opcode
//!   with the unmodified instruction word)

use std::sync::OnceLock;

use class_model::opcodes as op;
use core_types::{DispatchKind, ExecResult};

use crate::exec::{self, Machine};

/// A per-opcode handler entry point.
pub type Handler = for<'a, 'b> fn(&'a mut Machine<'b>, u8, u16) -> ExecResult<()>;

/// Execute one instruction under the machine's configured strategy.
#[inline]
pub fn execute(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    match m.dispatch_kind() {
        DispatchKind::Portable => execute_portable(m, opcode, word),
        DispatchKind::Threaded => handler_table()[opcode as usize](m, opcode, word),
    }
}

/// The portable strategy: a single `match`.
pub fn execute_portable(m: &mut Machine, opcode: u8, word: u16) -> ExecResult<()> {
    match opcode {
        op::OP_NOP => exec::op_nop(m, opcode, word),
        op::OP_MOVE
        | op::OP_MOVE_FROM16
        | op::OP_MOVE_16
        | op::OP_MOVE_OBJECT
        | op::OP_MOVE_OBJECT_FROM16
        | op::OP_MOVE_OBJECT_16 => exec::op_move(m, opcode, word),
        op::OP_MOVE_WIDE | op::OP_MOVE_WIDE_FROM16 | op::OP_MOVE_WIDE_16 => {
            exec::op_move_wide(m, opcode, word)
        }
        op::OP_MOVE_RESULT | op::OP_MOVE_RESULT_WIDE | op::OP_MOVE_RESULT_OBJECT => {
            exec::op_move_result(m, opcode, word)
        }
        op::OP_MOVE_EXCEPTION => exec::op_move_exception(m, opcode, word),
        op::OP_RETURN_VOID | op::OP_RETURN | op::OP_RETURN_WIDE | op::OP_RETURN_OBJECT => {
            exec::op_return(m, opcode, word)
        }
        op::OP_CONST_4..=op::OP_CONST_WIDE_HIGH16 => exec::op_const(m, opcode, word),
        op::OP_CONST_STRING | op::OP_CONST_STRING_JUMBO => {
            exec::op_const_string(m, opcode, word)
        }
        op::OP_CONST_CLASS => exec::op_const_class(m, opcode, word),
        op::OP_MONITOR_ENTER | op::OP_MONITOR_EXIT => exec::op_monitor(m, opcode, word),
        op::OP_CHECK_CAST => exec::op_check_cast(m, opcode, word),
        op::OP_INSTANCE_OF => exec::op_instance_of(m, opcode, word),
        op::OP_ARRAY_LENGTH => exec::op_array_length(m, opcode, word),
        op::OP_NEW_INSTANCE => exec::op_new_instance(m, opcode, word),
        op::OP_NEW_ARRAY => exec::op_new_array(m, opcode, word),
        op::OP_FILL_ARRAY_DATA => exec::op_fill_array_data(m, opcode, word),
        op::OP_THROW => exec::op_throw(m, opcode, word),
        op::OP_GOTO | op::OP_GOTO_16 | op::OP_GOTO_32 => exec::op_goto(m, opcode, word),
        op::OP_PACKED_SWITCH | op::OP_SPARSE_SWITCH => exec::op_switch(m, opcode, word),
        op::OP_CMPL_FLOAT..=op::OP_CMP_LONG => exec::op_cmp(m, opcode, word),
        op::OP_IF_EQ..=op::OP_IF_LE => exec::op_if(m, opcode, word),
        op::OP_IF_EQZ..=op::OP_IF_LEZ => exec::op_ifz(m, opcode, word),
        op::OP_AGET..=op::OP_AGET_SHORT => exec::op_aget(m, opcode, word),
        op::OP_APUT..=op::OP_APUT_SHORT => exec::op_aput(m, opcode, word),
        op::OP_IGET..=op::OP_IGET_SHORT => exec::op_iget(m, opcode, word),
        op::OP_IPUT..=op::OP_IPUT_SHORT => exec::op_iput(m, opcode, word),
        op::OP_SGET..=op::OP_SGET_SHORT => exec::op_sget(m, opcode, word),
        op::OP_SPUT..=op::OP_SPUT_SHORT => exec::op_sput(m, opcode, word),
        op::OP_INVOKE_VIRTUAL..=op::OP_INVOKE_INTERFACE
        | op::OP_INVOKE_VIRTUAL_RANGE..=op::OP_INVOKE_INTERFACE_RANGE => {
            exec::op_invoke(m, opcode, word)
        }
        op::OP_NEG_INT..=op::OP_INT_TO_SHORT => exec::op_unop(m, opcode, word),
        op::OP_ADD_INT..=op::OP_REM_DOUBLE => exec::op_binop(m, opcode, word),
        op::OP_ADD_INT_2ADDR..=op::OP_REM_DOUBLE_2ADDR => {
            exec::op_binop_2addr(m, opcode, word)
        }
        op::OP_ADD_INT_LIT16..=op::OP_XOR_INT_LIT16 => exec::op_binop_lit16(m, opcode, word),
        op::OP_ADD_INT_LIT8..=op::OP_USHR_INT_LIT8 => exec::op_binop_lit8(m, opcode, word),
        _ => exec::op_unused(m, opcode, word),
    }
}

/// The threaded strategy's handler table. Built once; unused opcodes
/// route to the invariant-violation handler.
pub fn handler_table() -> &'static [Handler; 256] {
    static TABLE: OnceLock<[Handler; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t: [Handler; 256] = [exec::op_unused; 256];
        t[op::OP_NOP as usize] = exec::op_nop;
        for opcode in [
            op::OP_MOVE,
            op::OP_MOVE_FROM16,
            op::OP_MOVE_16,
            op::OP_MOVE_OBJECT,
            op::OP_MOVE_OBJECT_FROM16,
            op::OP_MOVE_OBJECT_16,
        ] {
            t[opcode as usize] = exec::op_move;
        }
        for opcode in [op::OP_MOVE_WIDE, op::OP_MOVE_WIDE_FROM16, op::OP_MOVE_WIDE_16] {
            t[opcode as usize] = exec::op_move_wide;
        }
        for opcode in [
            op::OP_MOVE_RESULT,
            op::OP_MOVE_RESULT_WIDE,
            op::OP_MOVE_RESULT_OBJECT,
        ] {
            t[opcode as usize] = exec::op_move_result;
        }
        t[op::OP_MOVE_EXCEPTION as usize] = exec::op_move_exception;
        for opcode in op::OP_RETURN_VOID..=op::OP_RETURN_OBJECT {
            t[opcode as usize] = exec::op_return;
        }
        for opcode in op::OP_CONST_4..=op::OP_CONST_WIDE_HIGH16 {
            t[opcode as usize] = exec::op_const;
        }
        t[op::OP_CONST_STRING as usize] = exec::op_const_string;
        t[op::OP_CONST_STRING_JUMBO as usize] = exec::op_const_string;
        t[op::OP_CONST_CLASS as usize] = exec::op_const_class;
        t[op::OP_MONITOR_ENTER as usize] = exec::op_monitor;
        t[op::OP_MONITOR_EXIT as usize] = exec::op_monitor;
        t[op::OP_CHECK_CAST as usize] = exec::op_check_cast;
        t[op::OP_INSTANCE_OF as usize] = exec::op_instance_of;
        t[op::OP_ARRAY_LENGTH as usize] = exec::op_array_length;
        t[op::OP_NEW_INSTANCE as usize] = exec::op_new_instance;
        t[op::OP_NEW_ARRAY as usize] = exec::op_new_array;
        t[op::OP_FILL_ARRAY_DATA as usize] = exec::op_fill_array_data;
        t[op::OP_THROW as usize] = exec::op_throw;
        for opcode in op::OP_GOTO..=op::OP_GOTO_32 {
            t[opcode as usize] = exec::op_goto;
        }
        t[op::OP_PACKED_SWITCH as usize] = exec::op_switch;
        t[op::OP_SPARSE_SWITCH as usize] = exec::op_switch;
        for opcode in op::OP_CMPL_FLOAT..=op::OP_CMP_LONG {
            t[opcode as usize] = exec::op_cmp;
        }
        for opcode in op::OP_IF_EQ..=op::OP_IF_LE {
            t[opcode as usize] = exec::op_if;
        }
        for opcode in op::OP_IF_EQZ..=op::OP_IF_LEZ {
            t[opcode as usize] = exec::op_ifz;
        }
        for opcode in op::OP_AGET..=op::OP_AGET_SHORT {
            t[opcode as usize] = exec::op_aget;
        }
        for opcode in op::OP_APUT..=op::OP_APUT_SHORT {
            t[opcode as usize] = exec::op_aput;
        }
        for opcode in op::OP_IGET..=op::OP_IGET_SHORT {
            t[opcode as usize] = exec::op_iget;
        }
        for opcode in op::OP_IPUT..=op::OP_IPUT_SHORT {
            t[opcode as usize] = exec::op_iput;
        }
        for opcode in op::OP_SGET..=op::OP_SGET_SHORT {
            t[opcode as usize] = exec::op_sget;
        }
        for opcode in op::OP_SPUT..=op::OP_SPUT_SHORT {
            t[opcode as usize] = exec::op_sput;
        }
        for opcode in op::OP_INVOKE_VIRTUAL..=op::OP_INVOKE_INTERFACE {
            t[opcode as usize] = exec::op_invoke;
        }
        for opcode in op::OP_INVOKE_VIRTUAL_RANGE..=op::OP_INVOKE_INTERFACE_RANGE {
            t[opcode as usize] = exec::op_invoke;
        }
        for opcode in op::OP_NEG_INT..=op::OP_INT_TO_SHORT {
            t[opcode as usize] = exec::op_unop;
        }
        for opcode in op::OP_ADD_INT..=op::OP_REM_DOUBLE {
            t[opcode as usize] = exec::op_binop;
        }
        for opcode in op::OP_ADD_INT_2ADDR..=op::OP_REM_DOUBLE_2ADDR {
            t[opcode as usize] = exec::op_binop_2addr;
        }
        for opcode in op::OP_ADD_INT_LIT16..=op::OP_XOR_INT_LIT16 {
            t[opcode as usize] = exec::op_binop_lit16;
        }
        for opcode in op::OP_ADD_INT_LIT8..=op::OP_USHR_INT_LIT8 {
            t[opcode as usize] = exec::op_binop_lit8;
        }
        t
    })
}
