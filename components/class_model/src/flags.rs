//! Access flags for classes, methods and fields

/// Publicly accessible.
pub const ACC_PUBLIC: u32 = 0x0001;
/// Private to the defining class.
pub const ACC_PRIVATE: u32 = 0x0002;
/// Protected access.
pub const ACC_PROTECTED: u32 = 0x0004;
/// Static member.
pub const ACC_STATIC: u32 = 0x0008;
/// Final (no overriding / reassignment).
pub const ACC_FINAL: u32 = 0x0010;
/// Method is synchronized (monitor held across the body).
pub const ACC_SYNCHRONIZED: u32 = 0x0020;
/// Field requires acquire/release ordering on every access.
pub const ACC_VOLATILE: u32 = 0x0040;
/// Method body is provided by the native registry.
pub const ACC_NATIVE: u32 = 0x0100;
/// Class is an interface.
pub const ACC_INTERFACE: u32 = 0x0200;
/// Abstract class or method (no body).
pub const ACC_ABSTRACT: u32 = 0x0400;
/// Method is a constructor (instance or static initializer).
pub const ACC_CONSTRUCTOR: u32 = 0x0001_0000;
