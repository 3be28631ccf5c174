//! Invocation of the DSpace batch metadata command-line tools
//!
//! The bridge's correctness is fully determined by the CSV files it reads
//! and writes; this module only hands bulk export/import to the DSpace
//! launcher and checks the exit status. Output of the child process goes to
//! log files, not memory. A non-zero exit aborts the run with the child's
//! own exit code and an error naming the log file to inspect.

use crate::config::Config;
use crate::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Refuse to clobber an existing output file unless overwriting is allowed
///
/// Advisory only: it protects an unreviewed prior batch from a careless
/// rerun, not against concurrent writers.
pub fn ensure_overwritable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::output_exists(path.display().to_string()));
    }
    Ok(())
}

/// Runs DSpace `metadata-export` / `metadata-import` synchronously
#[derive(Debug)]
pub struct DspaceBridge {
    dspace_command: String,
    collection_handle: String,
    import_user_email: String,
    import_confirm: bool,
    export_logs: (PathBuf, PathBuf),
    import_logs: (PathBuf, PathBuf),
}

impl DspaceBridge {
    /// Create a bridge from deployment configuration
    pub fn new(config: &Config) -> Self {
        Self {
            dspace_command: config.dspace_command.clone(),
            collection_handle: config.collection_handle.clone(),
            import_user_email: config.import_user_email.clone(),
            import_confirm: config.import_confirm,
            export_logs: config.export_logs(),
            import_logs: config.import_logs(),
        }
    }

    /// Export the configured collection's metadata to a CSV file
    pub fn export_collection(&self, output_csv: &Path) -> Result<()> {
        let command_line = format!(
            "{} metadata-export -f '{}' -i '{}'",
            self.dspace_command,
            output_csv.display(),
            self.collection_handle
        );
        let (log, err_log) = self.export_logs.clone();
        self.run(&command_line, &log, &err_log)
    }

    /// Import a merged batch CSV as the configured e-person
    ///
    /// The import tool prompts for confirmation; the configured answer is
    /// piped in, so `import_confirm = false` leaves it a reviewable dry run.
    pub fn import_batch(&self, batch_csv: &Path) -> Result<()> {
        let answer = if self.import_confirm { "y" } else { "n" };
        let command_line = format!(
            "echo {} | {} metadata-import -f '{}' -e '{}'",
            answer,
            self.dspace_command,
            batch_csv.display(),
            self.import_user_email
        );
        let (log, err_log) = self.import_logs.clone();
        self.run(&command_line, &log, &err_log)
    }

    /// Run one shell command line, stdout and stderr redirected to log files
    fn run(&self, command_line: &str, log: &Path, err_log: &Path) -> Result<()> {
        for path in [log, err_log] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::io(format!("failed to create log directory {}", parent.display()), e)
                })?;
            }
        }
        let stdout = File::create(log)
            .map_err(|e| Error::io(format!("failed to create log file {}", log.display()), e))?;
        let stderr = File::create(err_log).map_err(|e| {
            Error::io(format!("failed to create log file {}", err_log.display()), e)
        })?;

        info!("running: {}", command_line);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| Error::io(format!("failed to spawn '{command_line}'"), e))?;
        debug!("command exited with {:?}", status.code());

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(Error::external_command(
                command_line,
                code,
                err_log.display().to_string(),
            )),
            // Killed by signal: no code to propagate, report failure.
            None => Err(Error::external_command(
                command_line,
                1,
                err_log.display().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bridge_with_logs(temp: &TempDir) -> DspaceBridge {
        let mut config = Config::default();
        config.log_dir = temp.path().join("log");
        DspaceBridge::new(&config)
    }

    #[test]
    fn test_ensure_overwritable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("batch.csv");

        // Nothing there yet: fine either way.
        assert!(ensure_overwritable(&path, false).is_ok());

        std::fs::write(&path, "data").unwrap();
        assert!(matches!(
            ensure_overwritable(&path, false),
            Err(Error::OutputExists { .. })
        ));
        assert!(ensure_overwritable(&path, true).is_ok());
    }

    #[test]
    fn test_run_success_writes_logs() {
        let temp = TempDir::new().unwrap();
        let bridge = bridge_with_logs(&temp);
        let log = temp.path().join("log/out.log");
        let err_log = temp.path().join("log/out.err");

        bridge.run("echo exported", &log, &err_log).unwrap();

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "exported\n");
        assert_eq!(std::fs::read_to_string(&err_log).unwrap(), "");
    }

    #[test]
    fn test_run_failure_carries_exit_code() {
        let temp = TempDir::new().unwrap();
        let bridge = bridge_with_logs(&temp);
        let log = temp.path().join("log/out.log");
        let err_log = temp.path().join("log/out.err");

        let result = bridge.run("exit 3", &log, &err_log);
        match result {
            Err(Error::ExternalCommand { code, log, .. }) => {
                assert_eq!(code, 3);
                assert!(log.ends_with("out.err"));
            }
            other => panic!("expected ExternalCommand error, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_code_propagation() {
        let error = Error::external_command("dspace metadata-export", 4, "x.err");
        assert_eq!(error.exit_code(), 4);
        assert_eq!(Error::configuration("bad").exit_code(), 1);
    }
}
