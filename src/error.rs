//! Error types for extexec.
//!
//! Uses thiserror for derive macros. Non-zero exit codes and stderr output of
//! a child process are result data, never errors.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for extexec operations.
///
/// Each variant maps to a specific exit code of the `extexec` binary.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The caller passed something unusable (empty command, zero chunk size,
    /// a drainer used out of order).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Spawning the child, feeding its input, waiting on it, or reading one of
    /// its streams failed. `context` names the program or stream involved.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The child did not exit before the configured deadline and was killed.
    #[error("'{program}' did not exit within {timeout:?} and was killed")]
    Timeout { program: String, timeout: Duration },

    /// A session configuration file could not be read, parsed, or validated.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExecError {
    /// Build an [`ExecError::Io`] from a context message and its cause.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ExecError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::InvalidArgument(_) => exit_codes::INVALID_ARGUMENT,
            ExecError::Config(_) => exit_codes::CONFIG_FAILURE,
            ExecError::Io { .. } => exit_codes::IO_FAILURE,
            ExecError::Timeout { .. } => exit_codes::TIMEOUT,
        }
    }
}

/// Result type alias for extexec operations.
pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn invalid_argument_has_correct_exit_code() {
        let err = ExecError::InvalidArgument("command must not be empty".to_string());
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
    }

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = ExecError::Config("chunk_size must be greater than 0".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn io_error_has_correct_exit_code() {
        let err = ExecError::io("failed to spawn 'r.info'", io::Error::other("boom"));
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
    }

    #[test]
    fn timeout_error_has_correct_exit_code() {
        let err = ExecError::Timeout {
            program: "sleep".to_string(),
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.exit_code(), exit_codes::TIMEOUT);
    }

    #[test]
    fn io_error_keeps_context_and_source() {
        let err = ExecError::io(
            "failed to spawn 'g.region'",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "failed to spawn 'g.region': No such file or directory"
        );
        let source = err.source().expect("io errors carry their cause");
        assert_eq!(source.to_string(), "No such file or directory");
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ExecError::InvalidArgument("command must not be empty".to_string());
        assert_eq!(err.to_string(), "invalid argument: command must not be empty");

        let err = ExecError::Timeout {
            program: "sleep".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "'sleep' did not exit within 2s and was killed");
    }
}
