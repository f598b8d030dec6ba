//! Implementation of the `extexec config` command.
//!
//! Prints the effective session configuration (defaults filled in) followed
//! by the environment overrides every session call would receive.

use crate::cli::ConfigArgs;
use crate::error::{ExecError, Result};
use crate::exit_codes;
use crate::session::ToolSession;
use std::io::Write;

/// Execute the `extexec config` command.
pub fn cmd_config(args: ConfigArgs) -> Result<i32> {
    let session = ToolSession::from_config_file(&args.config)?;
    let report = render_report(&session)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(report.as_bytes())
        .map_err(|e| ExecError::io("failed to write config report", e))?;

    Ok(exit_codes::SUCCESS)
}

fn render_report(session: &ToolSession) -> Result<String> {
    let mut report = session.config().to_yaml()?;
    if !report.ends_with('\n') {
        report.push('\n');
    }

    let env = session.environment()?;
    report.push_str("\n# environment\n");
    if env.is_empty() {
        report.push_str("# (none)\n");
    }
    for (key, value) in env.iter() {
        report.push_str(&format!("{}={}\n", key, value));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn report_includes_defaults_and_environment() {
        let config = SessionConfig::from_yaml(
            "environment:\n  GRASS_VERBOSE: \"0\"\n",
        )
        .unwrap();
        let session = ToolSession::new(config).unwrap();

        let report = render_report(&session).unwrap();
        assert!(report.contains("shell: /bin/bash"));
        assert!(report.contains("chunk_size: 128"));
        assert!(report.contains("# environment\nGRASS_VERBOSE=0\n"));
    }

    #[test]
    fn report_marks_empty_environment() {
        let session = ToolSession::new(SessionConfig::default()).unwrap();
        let report = render_report(&session).unwrap();
        assert!(report.ends_with("# environment\n# (none)\n"));
    }

    #[test]
    fn invalid_config_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("session.yaml");
        std::fs::write(&path, "chunk_size: 0\n").unwrap();

        let result = cmd_config(ConfigArgs { config: path });
        assert!(matches!(result, Err(ExecError::Config(_))));
    }
}
