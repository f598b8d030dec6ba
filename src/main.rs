//! Extexec: run external programs with concurrent output draining.
//!
//! This is the main entry point for the `extexec` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and maps
//! the outcome to an exit code.

use extexec::cli::Cli;
use extexec::{commands, exit_codes, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init_logging(cli.log_level);

    match commands::dispatch(cli.command) {
        Ok(code) => ExitCode::from(exit_codes::to_status_byte(code)),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(exit_codes::to_status_byte(err.exit_code()))
        }
    }
}
