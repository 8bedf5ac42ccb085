//! Bounded child-process execution shared by the test runner and deployer.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ExecError;

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `argv` to completion, killing it if it outlives `timeout`.
///
/// The child is spawned with `kill_on_drop`, so expiry of the timeout drops
/// the wait future and forcibly terminates the process.
pub async fn run_with_timeout(
    argv: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ProcessOutput, ExecError> {
    let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ExecError::TimedOut {
            limit_secs: timeout.as_secs(),
        })?
        .map_err(ExecError::Wait)?;

    Ok(ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
