//! Argument and result marshaling
//!
//! Arguments arrive as the callee's raw register window: one 32-bit
//! slot per narrow value, two consecutive slots (low word first) per
//! 64-bit value, references as raw handles. The shorty drives the
//! typed conversion; sub-int returns are widened according to the
//! signature's leading character.

use core_types::primitive::shorty_is_wide;
use core_types::value::wide_from_words;
use core_types::{JValue, ObjRef};

use crate::hints::ReturnKind;

/// Unpack declared arguments (receiver excluded) from `slots`.
///
/// Returns None if the window is shorter than the signature demands -
/// an invariant violation in verified code, surfaced to the caller so
/// it can abort loudly.
pub fn unpack_args(shorty: &str, slots: &[u32]) -> Option<Vec<JValue>> {
    let mut args = Vec::with_capacity(shorty.len() - 1);
    let mut i = 0usize;
    for &c in &shorty.as_bytes()[1..] {
        if shorty_is_wide(c) {
            let low = *slots.get(i)?;
            let high = *slots.get(i + 1)?;
            let raw = wide_from_words(low, high);
            args.push(if c == b'J' {
                JValue::Long(raw as i64)
            } else {
                JValue::Double(f64::from_bits(raw))
            });
            i += 2;
        } else {
            let raw = *slots.get(i)?;
            args.push(match c {
                b'L' => JValue::Object(ObjRef::from_raw(raw)),
                b'F' => JValue::Float(f32::from_bits(raw)),
                _ => JValue::Int(raw as i32),
            });
            i += 1;
        }
    }
    Some(args)
}

/// Normalize a native result to the signature's return kind, widening
/// 8/16-bit values into a full register word.
pub fn widen_return(kind: ReturnKind, value: JValue) -> JValue {
    match kind {
        ReturnKind::Void => JValue::Void,
        ReturnKind::Signed8 => JValue::Int(expect_int(value) as i8 as i32),
        ReturnKind::Signed16 => JValue::Int(expect_int(value) as i16 as i32),
        ReturnKind::Unsigned16 => JValue::Int(expect_int(value) as u16 as i32),
        ReturnKind::Plain | ReturnKind::Float | ReturnKind::Double | ReturnKind::Wide => value,
    }
}

fn expect_int(value: JValue) -> i32 {
    match value {
        JValue::Int(v) => v,
        other => panic!("native method returned {other:?} for an integer signature"),
    }
}
