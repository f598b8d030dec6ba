//! Config loading, validation, and derived paths.

use super::model::SessionConfig;
use crate::error::{ExecError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

impl SessionConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the session YAML file
    ///
    /// # Returns
    ///
    /// * `Ok(SessionConfig)` - Successfully loaded and validated config
    /// * `Err(ExecError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExecError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ExecError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ExecError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `chunk_size` must be positive
    /// - `timeout_seconds`, when set, must be positive
    /// - `shell` and `python` must be non-empty
    /// - `environment` keys must be non-empty and contain no `=`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ExecError::Config(
                "config validation failed: chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.timeout_seconds == Some(0) {
            return Err(ExecError::Config(
                "config validation failed: timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.shell.trim().is_empty() {
            return Err(ExecError::Config(
                "config validation failed: shell must not be empty".to_string(),
            ));
        }
        if self.python.trim().is_empty() {
            return Err(ExecError::Config(
                "config validation failed: python must not be empty".to_string(),
            ));
        }

        for key in self.environment.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(ExecError::Config(format!(
                    "config validation failed: invalid environment variable name '{}'",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Directory holding module executables, if known.
    pub fn executables_dir(&self) -> Option<PathBuf> {
        self.executables
            .clone()
            .or_else(|| self.gisbase.as_ref().map(|base| base.join("bin")))
    }

    /// Directory holding scripts, if known.
    pub fn scripts_dir(&self) -> Option<PathBuf> {
        self.scripts
            .clone()
            .or_else(|| self.gisbase.as_ref().map(|base| base.join("scripts")))
    }

    /// Configured per-call timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
