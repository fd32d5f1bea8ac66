//! Runtime options
//!
//! Options come from CLI flags and an optional JSON options file; the
//! parsed struct is handed to `RuntimeContext` at startup and never
//! changes afterwards.

use serde::Deserialize;

/// Interpreter dispatch strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKind {
    /// Single `match` over the opcode byte.
    Portable,
    /// 256-entry handler-function table.
    #[default]
    Threaded,
}

/// Debugger transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JdwpTransportKind {
    /// TCP listen socket.
    #[default]
    Socket,
    /// Host-bridge control socket (descriptor passing).
    Control,
}

/// Startup configuration for the runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// Heap budget in bytes.
    pub heap_max_bytes: usize,
    /// Per-thread frame region size in register slots.
    pub stack_region_slots: usize,
    /// Dispatch strategy.
    pub dispatch: DispatchKind,
    /// Debugger listen port; None disables the debugger thread.
    pub jdwp_port: Option<u16>,
    /// Debugger transport kind.
    pub jdwp_transport: JdwpTransportKind,
    /// Instructions between counted safepoint polls.
    pub safepoint_interval: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            heap_max_bytes: 16 * 1024 * 1024,
            stack_region_slots: 16 * 1024,
            dispatch: DispatchKind::default(),
            jdwp_port: None,
            jdwp_transport: JdwpTransportKind::default(),
            safepoint_interval: 1000,
        }
    }
}
