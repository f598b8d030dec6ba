//! CLI argument parsing for extexec.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Extexec: run external programs with concurrent stdout/stderr draining.
///
/// Child output is captured without pipe-buffer deadlock, optional input is
/// fed to stdin, and the child's exit code becomes this program's exit code.
#[derive(Parser, Debug)]
#[command(name = "extexec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (overrides EXTEXEC_LOG).
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for extexec.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one external command and report its output.
    ///
    /// The command is given after `--` or as a single string with `--line`.
    Run(RunArgs),

    /// Run a script through a configured tool session.
    ///
    /// Parameters are `key=value` pairs or bare flags.
    Script(ScriptArgs),

    /// Show the effective session configuration and derived environment.
    Config(ConfigArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Environment override for the child (repeatable).
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Text written to the child's stdin.
    #[arg(long, conflicts_with = "input_file")]
    pub input: Option<String>,

    /// File whose contents are written to the child's stdin.
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Kill the child if it has not exited after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Bytes requested per read from each output stream.
    #[arg(long, default_value_t = crate::exec::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Print the result as JSON instead of forwarding the streams.
    #[arg(long)]
    pub json: bool,

    /// Whole command line as one string, split with shell quoting rules.
    #[arg(long, conflicts_with = "command")]
    pub line: Option<String>,

    /// Working directory for the child.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Program and arguments.
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Arguments for the `script` command.
#[derive(Parser, Debug)]
pub struct ScriptArgs {
    /// Session configuration file (YAML).
    #[arg(long)]
    pub config: PathBuf,

    /// Use the configured python interpreter instead of the shell.
    #[arg(long)]
    pub python: bool,

    /// Append `--quiet` to the script's arguments.
    #[arg(long)]
    pub quiet: bool,

    /// Print the result as JSON instead of forwarding the streams.
    #[arg(long)]
    pub json: bool,

    /// Script name, relative to the configured scripts directory.
    pub script: String,

    /// Script parameters (`key=value` or flags).
    #[arg(allow_hyphen_values = true)]
    pub params: Vec<String>,
}

/// Arguments for the `config` command.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Session configuration file (YAML).
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
