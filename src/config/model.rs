//! Session configuration model.

use super::types::{default_chunk_size, default_python, default_shell, default_true};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a [`ToolSession`](crate::session::ToolSession).
///
/// Represents a YAML file such as:
///
/// ```yaml
/// gisbase: /usr/local/grass
/// gisrc: /tmp/medland/.grassrc
/// gisdbase: /data/grassdata
/// location: penaguila
/// mapset: run01
/// shell: /bin/bash
/// library_paths:
///   - /usr/local/lib
/// environment:
///   GRASS_VERBOSE: "0"
/// timeout_seconds: 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tool installation root (`GISBASE`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gisbase: Option<PathBuf>,

    /// Session rc file the tools read (`GISRC`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gisrc: Option<PathBuf>,

    /// Database directory written to the rc file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gisdbase: Option<PathBuf>,

    /// Location name written to the rc file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Mapset name written to the rc file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapset: Option<String>,

    /// Directory of module executables (defaults to `<gisbase>/bin`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executables: Option<PathBuf>,

    /// Directory of scripts (defaults to `<gisbase>/scripts`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<PathBuf>,

    /// Interpreter for shell scripts.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Interpreter for Python scripts.
    #[serde(default = "default_python")]
    pub python: String,

    /// Extra dynamic library search paths appended to `LD_LIBRARY_PATH`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub library_paths: Vec<PathBuf>,

    /// Fixed overrides applied after the derived variables.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,

    /// Per-call timeout; no timeout when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Drainer chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Log stderr text of every call at info level.
    #[serde(default = "default_true")]
    pub show_errors: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gisbase: None,
            gisrc: None,
            gisdbase: None,
            location: None,
            mapset: None,
            executables: None,
            scripts: None,
            shell: default_shell(),
            python: default_python(),
            library_paths: Vec::new(),
            environment: IndexMap::new(),
            timeout_seconds: None,
            chunk_size: default_chunk_size(),
            show_errors: true,
        }
    }
}
