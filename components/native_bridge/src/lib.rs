//! The native-call bridge
//!
//! Translates an interpreted call (a shorty signature plus a raw
//! register-argument window) into a call on a registered native
//! function, and the result back into a register-file value. All
//! calling-convention knowledge lives behind [`CallStrategy`]:
//! - [`GenericCall`] re-scans the signature on every invocation
//! - [`HintedCall`] precomputes a compact argument-layout word per
//!   method ([`hints::ArgInfo`]) and skips the re-scan on repeat calls
//!
//! Both strategies must produce identical results for every signature.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hints;
pub mod marshal;
pub mod strategy;

pub use hints::ArgInfo;
pub use marshal::{unpack_args, widen_return};
pub use strategy::{invoke_native, CallStrategy, GenericCall, HintedCall};
