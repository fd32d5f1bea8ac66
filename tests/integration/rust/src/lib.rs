//! Cross-component integration tests for the Forge VM
//!
//! The tests live in `tests/`; this library only exists to anchor the
//! workspace member.
