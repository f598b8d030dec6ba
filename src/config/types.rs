//! Default value functions for the session config.

use crate::exec::DEFAULT_CHUNK_SIZE;

// Default value functions for serde
pub(crate) fn default_shell() -> String {
    "/bin/bash".to_string()
}
pub(crate) fn default_python() -> String {
    "python3".to_string()
}
pub(crate) fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
pub(crate) fn default_true() -> bool {
    true
}
