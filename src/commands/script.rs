//! Implementation of the `extexec script` command.

use super::emit_to_console;
use crate::cli::ScriptArgs;
use crate::error::Result;
use crate::session::{Interpreter, Param, ToolSession};

/// Execute the `extexec script` command.
///
/// Loads the session config, runs the script through the chosen interpreter,
/// and returns the script's exit code.
pub fn cmd_script(args: ScriptArgs) -> Result<i32> {
    let session = ToolSession::from_config_file(&args.config)?;

    let interpreter = if args.python {
        Interpreter::Python
    } else {
        Interpreter::Shell
    };
    let params: Vec<Param> = args.params.iter().map(|token| Param::parse(token)).collect();

    let result = session.run_script(interpreter, &args.script, &params, args.quiet)?;

    emit_to_console(&result, args.json)?;
    Ok(result.exit_code)
}
