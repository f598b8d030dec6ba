//! Result of a single external program execution.

use serde::Serialize;

/// Captured output and exit code of one child process.
///
/// Produced once per invocation, after the child terminated and both of its
/// streams were drained. Nothing here is interpreted: a non-zero exit code or
/// text on `errors` is ordinary data, because many tools report progress on
/// stderr and return non-zero for non-fatal conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpResult {
    /// Everything the child wrote to stdout.
    pub output: String,
    /// Everything the child wrote to stderr.
    pub errors: String,
    /// Exit code of the child, verbatim. On Unix a child killed by a signal
    /// reports `128 + signal`; `-1` means no code was available.
    pub exit_code: i32,
    /// True when waiting was interrupted and the child was terminated early;
    /// the captured text is then whatever the child wrote before that.
    pub interrupted: bool,
}

impl OpResult {
    /// Returns true if the child wrote anything to stderr.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_all_fields() {
        let result = OpResult {
            output: "north: 4000\n".to_string(),
            errors: "100%\n".to_string(),
            exit_code: 0,
            interrupted: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["output"], "north: 4000\n");
        assert_eq!(json["errors"], "100%\n");
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["interrupted"], false);
    }

    #[test]
    fn has_errors_reflects_stderr_text() {
        let mut result = OpResult {
            output: String::new(),
            errors: String::new(),
            exit_code: 1,
            interrupted: false,
        };
        assert!(!result.has_errors());
        result.errors.push_str("warning");
        assert!(result.has_errors());
    }
}
