//! Exit code constants for the extexec CLI.
//!
//! These codes apply only when extexec itself fails:
//! - 0: Success
//! - 1: Invalid argument (empty command, bad flag values)
//! - 2: Configuration failure (unreadable or invalid session config)
//! - 3: I/O failure (spawn, input write, wait)
//! - 4: Timeout (child killed after its deadline)
//!
//! When a child runs to completion, `run` and `script` exit with the child's
//! own exit code instead.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Invalid argument: empty command, zero chunk size, malformed `KEY=VALUE`.
pub const INVALID_ARGUMENT: i32 = 1;

/// Configuration failure: session config could not be loaded or validated.
pub const CONFIG_FAILURE: i32 = 2;

/// I/O failure: the child could not be spawned, fed, or waited on.
pub const IO_FAILURE: i32 = 3;

/// Timeout: the child outlived its deadline and was killed.
pub const TIMEOUT: i32 = 4;

/// Convert a child's exit code into a process exit status byte.
///
/// Codes outside `0..=255` (e.g. `-1` for "no code available") become 255.
pub fn to_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(u8::MAX)
}
