//! Argument-layout hints
//!
//! Scanning a signature on every native call is wasted work for hot
//! methods, so the bridge computes a compact hint word per method the
//! first time it is called and caches it on the `MethodDef`:
//!
//! ```text
//! bit  31     force-slow-path flag (signature too large to encode)
//! bits 30..28 return kind
//! bits 27..20 total argument register slots (receiver included)
//! bits 19..0  wide-start bitmap: bit i set = a 64-bit value starts
//!             at argument slot i
//! ```
//!
//! Signatures needing more than 20 argument slots or 255 total slots
//! set the force-slow flag, and callers fall back to the full scan.
//! Cached value 0 means "not yet computed": a real hint always has a
//! nonzero return-kind field or the slow flag set.

use core_types::primitive::shorty_is_wide;

/// The return-value handling required by a signature's leading char.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReturnKind {
    /// `V`: no result.
    Void = 1,
    /// `F`: 32-bit float result slot.
    Float = 2,
    /// `D`: 64-bit float result slot.
    Double = 3,
    /// `J`: 64-bit integer result slot.
    Wide = 4,
    /// `I` and references: 32-bit slot, no widening.
    Plain = 5,
    /// `Z`/`B`: sign-extend the low 8 bits.
    Signed8 = 6,
    /// `C`: zero-extend the low 16 bits.
    Unsigned16 = 7,
    /// `S`: sign-extend the low 16 bits.
    Signed16 = 0,
}

const FORCE_SLOW: u32 = 1 << 31;
const RETURN_SHIFT: u32 = 28;
const SLOTS_SHIFT: u32 = 20;
const WIDE_BITS: u32 = 20;
const MAX_SLOTS: u32 = 255;

/// A method's cached argument-layout word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgInfo(pub u32);

impl ArgInfo {
    /// Compute the hint word for a shorty. `is_static` decides whether
    /// a receiver slot precedes the declared arguments.
    pub fn compute(shorty: &str, is_static: bool) -> ArgInfo {
        let bytes = shorty.as_bytes();
        let ret = return_kind_of(bytes[0]);

        let mut slots: u32 = u32::from(!is_static);
        let mut wide_map: u32 = 0;
        for &c in &bytes[1..] {
            if shorty_is_wide(c) {
                if slots < WIDE_BITS {
                    wide_map |= 1 << slots;
                }
                slots += 2;
            } else {
                slots += 1;
            }
        }
        if slots > MAX_SLOTS || slots > WIDE_BITS {
            // Too large to encode; callers take the generic scan
            return ArgInfo(FORCE_SLOW | ((ret as u32) << RETURN_SHIFT));
        }
        ArgInfo(((ret as u32) << RETURN_SHIFT) | (slots << SLOTS_SHIFT) | wide_map)
    }

    /// Whether the hint demands the generic scan.
    pub fn force_slow(self) -> bool {
        self.0 & FORCE_SLOW != 0
    }

    /// The encoded return kind.
    pub fn return_kind(self) -> ReturnKind {
        match (self.0 >> RETURN_SHIFT) & 0x7 {
            1 => ReturnKind::Void,
            2 => ReturnKind::Float,
            3 => ReturnKind::Double,
            4 => ReturnKind::Wide,
            5 => ReturnKind::Plain,
            6 => ReturnKind::Signed8,
            7 => ReturnKind::Unsigned16,
            _ => ReturnKind::Signed16,
        }
    }

    /// Total argument register slots (meaningless when force-slow).
    pub fn arg_slots(self) -> u32 {
        (self.0 >> SLOTS_SHIFT) & 0xff
    }

    /// Whether a 64-bit value starts at argument slot `i`.
    pub fn wide_starts_at(self, i: u32) -> bool {
        i < WIDE_BITS && (self.0 & (1 << i)) != 0
    }

    /// The raw cached word (never 0 for a computed hint).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Return kind for a shorty's leading character.
pub fn return_kind_of(c: u8) -> ReturnKind {
    match c {
        b'V' => ReturnKind::Void,
        b'F' => ReturnKind::Float,
        b'D' => ReturnKind::Double,
        b'J' => ReturnKind::Wide,
        b'Z' | b'B' => ReturnKind::Signed8,
        b'C' => ReturnKind::Unsigned16,
        b'S' => ReturnKind::Signed16,
        _ => ReturnKind::Plain,
    }
}
