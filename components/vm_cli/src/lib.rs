//! Forge VM launcher
//!
//! Parses CLI arguments, assembles the runtime, and runs one of the
//! built-in demo programs (the container-format loader is an external
//! collaborator, so the launcher carries its own demonstration unit).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod demos;
pub mod error;
pub mod runtime;

use clap::Parser;

pub use error::{CliError, CliResult};
pub use runtime::Runtime;

/// Command-line arguments for `forge-vm`.
#[derive(Debug, Parser)]
#[command(name = "forge-vm", about = "Forge managed-code execution engine")]
pub struct Cli {
    /// Demo program to run (sum, fact, throw)
    #[arg(default_value = "sum")]
    pub demo: String,

    /// Demo argument
    #[arg(short = 'n', long, default_value_t = 10)]
    pub arg: i32,

    /// Runtime options file (JSON)
    #[arg(long)]
    pub options: Option<String>,

    /// Interpreter dispatch strategy (portable | threaded)
    #[arg(long)]
    pub dispatch: Option<String>,

    /// Listen for a debugger on this TCP port
    #[arg(long)]
    pub jdwp_port: Option<u16>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
