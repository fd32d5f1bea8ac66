//! Error types for the launcher

use core_types::VmError;
use std::fmt;

/// Launcher-level errors.
#[derive(Debug)]
pub enum CliError {
    /// Runtime construction or unit loading failed.
    Vm(VmError),

    /// An uncaught exception terminated the program.
    Uncaught(String),

    /// Options file could not be read or parsed.
    Options(String),

    /// No demo with the requested name.
    UnknownDemo(String),

    /// Debugger transport failed to start.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Vm(e) => write!(f, "runtime error: {e}"),
            CliError::Uncaught(e) => write!(f, "uncaught exception: {e}"),
            CliError::Options(e) => write!(f, "bad options: {e}"),
            CliError::UnknownDemo(name) => write!(f, "unknown demo '{name}'"),
            CliError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Vm(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VmError> for CliError {
    fn from(err: VmError) -> Self {
        CliError::Vm(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

/// Result type for launcher operations.
pub type CliResult<T> = Result<T, CliError>;
