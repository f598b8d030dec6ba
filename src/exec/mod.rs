//! External program execution.
//!
//! - **Drainer**: reads one child stream on its own thread in bounded chunks
//! - **Executor**: spawns the child, feeds input, waits, collects output, and
//!   tears everything down on every path
//! - **Env**: ordered environment overrides merged into the child's environment
//! - **Result**: the captured `(output, errors, exit_code)` record
//!
//! Exit codes and stderr text are returned as data and never turned into
//! errors here; deciding what counts as failure is up to the caller.

pub mod drainer;
mod env;
mod executor;
mod result;


// Re-export public API
pub use drainer::{DEFAULT_CHUNK_SIZE, DrainerState, Fetch, StreamDrainer};
pub use env::EnvOverrides;
pub use executor::{InterruptHandle, ProcessExecutor, execute};
pub use result::OpResult;
