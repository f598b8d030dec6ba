//! Command implementations for extexec.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each command returns the exit code the binary should
//! report.

mod config;
mod run;
mod script;

use crate::cli::Command;
use crate::error::{ExecError, Result};
use crate::exec::OpResult;
use std::io::Write;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Script(args) => script::cmd_script(args),
        Command::Config(args) => config::cmd_config(args),
    }
}

/// Report a finished invocation.
///
/// Without `json` the captured streams are forwarded unchanged to `out` and
/// `err`; with it, the whole result is written to `out` as one JSON document.
pub(crate) fn emit_result<O, E>(result: &OpResult, json: bool, out: &mut O, err: &mut E) -> Result<()>
where
    O: Write,
    E: Write,
{
    if json {
        let rendered = serde_json::to_string_pretty(result)
            .map_err(|e| ExecError::io("failed to serialize result", e.into()))?;
        writeln!(out, "{}", rendered).map_err(|e| ExecError::io("failed to write result", e))?;
    } else {
        out.write_all(result.output.as_bytes())
            .map_err(|e| ExecError::io("failed to forward stdout", e))?;
        err.write_all(result.errors.as_bytes())
            .map_err(|e| ExecError::io("failed to forward stderr", e))?;
    }
    out.flush().map_err(|e| ExecError::io("failed to flush stdout", e))?;
    err.flush().map_err(|e| ExecError::io("failed to flush stderr", e))
}

/// Emit to the process's own stdout/stderr.
pub(crate) fn emit_to_console(result: &OpResult, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    emit_result(result, json, &mut stdout.lock(), &mut stderr.lock())
}
