//! Forge VM launcher entry point
//!
//! Parses CLI arguments, wires logging, and delegates to the Runtime.

use clap::Parser;
use vm_cli::{Cli, CliError, Runtime};

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let runtime = match Runtime::from_cli(&cli) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    match runtime.run_demo(&cli.demo, cli.arg) {
        Ok(result) => {
            log::info!("demo '{}' returned {result:?}", cli.demo);
            runtime.shutdown();
        }
        Err(CliError::Uncaught(e)) => {
            eprintln!("Uncaught exception: {e}");
            runtime.shutdown();
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            runtime.shutdown();
            std::process::exit(2);
        }
    }
}
