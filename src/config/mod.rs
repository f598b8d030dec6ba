//! Configuration model for extexec tool sessions.
//!
//! This module defines the `SessionConfig` struct that describes where an
//! external tool family lives and how its environment is assembled. It
//! supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

mod model;
mod operations;
mod types;


// Re-export public API
pub use model::SessionConfig;
