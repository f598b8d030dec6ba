//! Extexec: run external programs without pipe-buffer deadlock.
//!
//! The core is [`exec`]: a [`ProcessExecutor`] spawns one child, drains its
//! stdout and stderr concurrently through two [`StreamDrainer`]s, feeds
//! optional input to stdin, and returns an [`OpResult`] with the captured
//! text and the exit code. [`session`] layers environment and command-line
//! assembly for a family of external tools on top, configured through
//! [`config::SessionConfig`].
//!
//! ```no_run
//! use extexec::{EnvOverrides, ProcessExecutor};
//! use std::time::Duration;
//!
//! let env = EnvOverrides::new().with("LC_ALL", "C");
//! let result = ProcessExecutor::new()
//!     .with_timeout(Duration::from_secs(30))
//!     .execute(&["sort"], Some(&env), Some("b\na\n"))?;
//! assert_eq!(result.output, "a\nb\n");
//! # Ok::<(), extexec::ExecError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod logging;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ExecError, Result};
pub use exec::{EnvOverrides, InterruptHandle, OpResult, ProcessExecutor, StreamDrainer, execute};
pub use session::{Interpreter, Param, ToolSession};
