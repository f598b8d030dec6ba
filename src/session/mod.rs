//! Tool sessions: environment and command-line assembly for a family of
//! external tools.
//!
//! A [`ToolSession`] is an explicitly constructed, caller-owned value. It
//! derives the environment the tools need from its [`SessionConfig`]
//! (installation root, rc file, search paths, lock token), builds module and
//! script command lines, and runs each call through a fresh
//! [`ProcessExecutor`]. It makes no judgment about exit codes or stderr text.

mod params;


pub use params::{Param, render};

use crate::config::SessionConfig;
use crate::error::{ExecError, Result};
use crate::exec::{EnvOverrides, OpResult, ProcessExecutor};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Interpreter used by [`ToolSession::run_script`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    /// The configured `shell`.
    Shell,
    /// The configured `python`.
    Python,
}

/// Caller-owned handle for running one tool family's modules and scripts.
#[derive(Debug, Clone)]
pub struct ToolSession {
    config: SessionConfig,
}

impl ToolSession {
    /// Create a session from a validated config.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load the config at `path` and create a session from it.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(SessionConfig::load(path)?)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Environment overrides for every call made through this session.
    ///
    /// Order: `GISBASE`, `GISRC`, `PATH`, `LD_LIBRARY_PATH`, `GIS_LOCK`, then
    /// the configured `environment` entries, which may replace any of them.
    /// Variables whose source is not configured are left untouched.
    pub fn environment(&self) -> Result<EnvOverrides> {
        let mut env = EnvOverrides::new();
        let gisbase = self.config.gisbase.as_deref();

        if let Some(base) = gisbase {
            env.set("GISBASE", base.to_string_lossy());
        }
        if let Some(rc) = &self.config.gisrc {
            env.set("GISRC", rc.to_string_lossy());
        }

        if let Some(base) = gisbase {
            let path = extend_search_path("PATH", [base.join("bin"), base.join("scripts")])?;
            env.set("PATH", path);
        }

        let mut library_dirs = self.config.library_paths.clone();
        if let Some(base) = gisbase {
            library_dirs.push(base.join("lib"));
        }
        if !library_dirs.is_empty() {
            env.set("LD_LIBRARY_PATH", extend_search_path("LD_LIBRARY_PATH", library_dirs)?);
        }

        if gisbase.is_some() {
            env.set("GIS_LOCK", std::process::id().to_string());
        }

        env.extend(self.config.environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(env)
    }

    /// Run a module executable with parameters and optional stdin text.
    ///
    /// The module is looked up in the executables directory when one is
    /// configured, otherwise resolved through `PATH`.
    pub fn run_module(&self, name: &str, params: &[Param], input: Option<&str>) -> Result<OpResult> {
        let program = match self.config.executables_dir() {
            Some(dir) => dir.join(name).to_string_lossy().into_owned(),
            None => name.to_string(),
        };

        let mut command = vec![program];
        command.extend(render(params));
        self.run_labeled(name, &command, input)
    }

    /// Run a script through the configured interpreter.
    ///
    /// Relative script names are resolved against the scripts directory.
    /// `quiet` appends `--quiet`.
    pub fn run_script(
        &self,
        interpreter: Interpreter,
        script: &str,
        params: &[Param],
        quiet: bool,
    ) -> Result<OpResult> {
        let interpreter_program = match interpreter {
            Interpreter::Shell => self.config.shell.clone(),
            Interpreter::Python => self.config.python.clone(),
        };
        let script_path = match self.config.scripts_dir() {
            Some(dir) => dir.join(script),
            None => PathBuf::from(script),
        };

        let mut command = vec![interpreter_program, script_path.to_string_lossy().into_owned()];
        command.extend(render(params));
        if quiet {
            command.push("--quiet".to_string());
        }
        self.run_labeled(script, &command, None)
    }

    /// Run an arbitrary command with this session's environment.
    pub fn run(&self, command: &[String], input: Option<&str>) -> Result<OpResult> {
        let label = command.first().map(String::as_str).unwrap_or_default();
        self.run_labeled(label, command, input)
    }

    /// Write the tools' rc file, replacing any existing one.
    ///
    /// Returns the path written.
    pub fn write_rc_file(&self) -> Result<PathBuf> {
        let rc = self
            .config
            .gisrc
            .as_ref()
            .ok_or_else(|| ExecError::Config("gisrc is not configured".to_string()))?;
        let gisdbase = self
            .config
            .gisdbase
            .as_ref()
            .ok_or_else(|| ExecError::Config("gisdbase is not configured".to_string()))?;
        let location = self
            .config
            .location
            .as_deref()
            .ok_or_else(|| ExecError::Config("location is not configured".to_string()))?;
        let mapset = self
            .config
            .mapset
            .as_deref()
            .ok_or_else(|| ExecError::Config("mapset is not configured".to_string()))?;

        let content = format!(
            "GISDBASE: {}\nLOCATION_NAME: {}\nMAPSET: {}\nDIGITIZER: none\nGRASS_GUI: text\n",
            gisdbase.display(),
            location,
            mapset
        );
        std::fs::write(rc, content)
            .map_err(|e| ExecError::io(format!("failed to write rc file '{}'", rc.display()), e))?;

        debug!(path = %rc.display(), "wrote rc file");
        Ok(rc.clone())
    }

    fn run_labeled(&self, label: &str, command: &[String], input: Option<&str>) -> Result<OpResult> {
        let env = self.environment()?;
        let mut executor = ProcessExecutor::new().with_chunk_size(self.config.chunk_size);
        if let Some(timeout) = self.config.timeout() {
            executor = executor.with_timeout(timeout);
        }

        let command_line = shell_words::join(command);
        debug!(command = %command_line, "running tool command");

        match executor.execute(command, Some(&env), input) {
            Ok(result) => {
                if self.config.show_errors && result.has_errors() {
                    info!(
                        tool = label,
                        exit_code = result.exit_code,
                        stderr = %result.errors.trim_end(),
                        "tool wrote to stderr"
                    );
                }
                Ok(result)
            }
            Err(err) => {
                error!(command = %command_line, error = %err, "tool execution failed");
                Err(match err {
                    ExecError::Io { context, source } => ExecError::Io {
                        context: format!("an error occurred while executing {}: {}", label, context),
                        source,
                    },
                    other => other,
                })
            }
        }
    }
}

/// Append `extra` directories to the inherited value of `var`.
fn extend_search_path<I>(var: &str, extra: I) -> Result<String>
where
    I: IntoIterator<Item = PathBuf>,
{
    let inherited: OsString = std::env::var_os(var).unwrap_or_default();
    let mut entries: Vec<PathBuf> = std::env::split_paths(&inherited)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    entries.extend(extra);

    let joined = std::env::join_paths(entries)
        .map_err(|e| ExecError::Config(format!("cannot build {}: {}", var, e)))?;
    Ok(joined.to_string_lossy().into_owned())
}
