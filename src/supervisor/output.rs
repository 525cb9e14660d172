//! Captured output of child processes.

use std::path::Path;
use std::process::ExitStatus;

/// Exit code and captured output of a build step or server process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was terminated by a signal or is
    /// still running.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub(crate) fn from_output(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Reads the server's log files. Missing files read as empty.
    pub(crate) fn from_logs(status: Option<ExitStatus>, stdout: &Path, stderr: &Path) -> Self {
        Self {
            exit_code: status.and_then(|s| s.code()),
            stdout: read_lossy(stdout),
            stderr: read_lossy(stderr),
        }
    }
}

fn read_lossy(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not read server log");
            String::new()
        }
    }
}
