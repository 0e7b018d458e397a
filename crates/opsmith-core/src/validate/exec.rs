//! Tool subprocess execution with captured output.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::domain::{OpsmithError, Result};

/// Result of running one external tool command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Label used in diagnostics, e.g. `docker_build`.
    pub label: String,

    /// Exit code (-1 when the process was killed by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandResult {
    /// Whether the command exited zero.
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// stderr followed by stdout, for diagnostics. Most tools put the
    /// actionable error on stderr but terraform splits across both.
    pub fn combined_output(&self) -> String {
        let mut out = String::new();
        if !self.stderr.trim().is_empty() {
            out.push_str(self.stderr.trim());
        }
        if !self.stdout.trim().is_empty() {
            if !out.is_empty() {
                out.push_str("\n");
            }
            out.push_str(self.stdout.trim());
        }
        out
    }
}

/// Run one tool command in `cwd`, capturing output.
///
/// A nonzero exit code is NOT an error here; validators turn it into a
/// diagnostic. Errors are reserved for spawn failures and timeouts.
pub async fn run_command(
    label: &str,
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandResult> {
    let start = Instant::now();

    tracing::debug!(label, program, ?args, "tool.exec");

    // kill_on_drop: a command that outlives its timeout must not keep
    // running while the loop moves on to the next attempt.
    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| OpsmithError::ToolUnavailable {
            tool: program.to_string(),
            reason: e.to_string(),
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| OpsmithError::ToolTimeout {
            label: label.to_string(),
            seconds: timeout.as_secs(),
        })??;

    let result = CommandResult {
        label: label.to_string(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    tracing::debug!(
        label,
        exit_code = result.exit_code,
        duration_ms = result.duration_ms,
        "tool.done"
    );

    Ok(result)
}
