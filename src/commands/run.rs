//! Implementation of the `extexec run` command.

use super::emit_to_console;
use crate::cli::RunArgs;
use crate::error::{ExecError, Result};
use crate::exec::{EnvOverrides, ProcessExecutor};
use std::time::Duration;
use tracing::debug;

/// Execute the `extexec run` command.
///
/// Returns the child's exit code.
pub fn cmd_run(args: RunArgs) -> Result<i32> {
    let command = resolve_command(&args)?;
    let env = EnvOverrides::from_assignments(&args.env)?;
    let input = read_input(&args)?;

    let mut executor = ProcessExecutor::new().with_chunk_size(args.chunk_size);
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(ExecError::InvalidArgument(
                "--timeout must be greater than 0".to_string(),
            ));
        }
        executor = executor.with_timeout(Duration::from_secs(secs));
    }
    if let Some(dir) = &args.cwd {
        executor = executor.working_dir(dir);
    }

    debug!(command = %shell_words::join(&command), overrides = env.len(), "run");

    let env = (!env.is_empty()).then_some(&env);
    let result = executor.execute(&command, env, input.as_deref())?;

    emit_to_console(&result, args.json)?;
    Ok(result.exit_code)
}

/// Command vector from `--line` or the trailing arguments.
fn resolve_command(args: &RunArgs) -> Result<Vec<String>> {
    let command = match &args.line {
        Some(line) => shell_words::split(line)
            .map_err(|e| ExecError::InvalidArgument(format!("cannot parse --line: {}", e)))?,
        None => args.command.clone(),
    };

    if command.is_empty() {
        return Err(ExecError::InvalidArgument(
            "no command given; pass it after `--` or with --line".to_string(),
        ));
    }
    Ok(command)
}

fn read_input(args: &RunArgs) -> Result<Option<String>> {
    if let Some(text) = &args.input {
        return Ok(Some(text.clone()));
    }
    match &args.input_file {
        Some(path) => std::fs::read_to_string(path)
            .map(Some)
            .map_err(|e| ExecError::io(format!("failed to read input file '{}'", path.display()), e)),
        None => Ok(None),
    }
}
