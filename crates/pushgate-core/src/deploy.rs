//! Deploy script invocation.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExecError;
use crate::obs;
use crate::process::run_with_timeout;

/// Wall-clock limit for the deploy script.
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(120);

/// Interpreter the deploy script is handed to.
pub const DEFAULT_DEPLOY_SHELL: &str = "/bin/bash";

/// Why a deployment did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeployFailureKind {
    ScriptNotFound,
    TimedOut,
    NonZeroExit,
    ExecutionError,
}

/// Result of one deploy invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub succeeded: bool,

    /// Exit code, when the script ran to completion.
    pub exit_code: Option<i32>,

    /// Full captured stdout.
    pub stdout: String,

    /// Full captured stderr, or the launch fault text.
    pub stderr: String,

    /// Set iff `succeeded` is false.
    pub failure_kind: Option<DeployFailureKind>,
}

impl DeployOutcome {
    /// A failure with no process output.
    pub fn failed(kind: DeployFailureKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message.into(),
            failure_kind: Some(kind),
        }
    }
}

/// Applies a new build to the running environment.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Invoke the deploy procedure exactly once. Never retries.
    async fn deploy(&self, script: &Path) -> DeployOutcome;
}

/// [`Deployer`] that runs a script through a shell.
#[derive(Debug, Clone)]
pub struct ScriptDeployer {
    shell: PathBuf,
    timeout: Duration,
}

impl ScriptDeployer {
    pub fn new(shell: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Deployer for ScriptDeployer {
    async fn deploy(&self, script: &Path) -> DeployOutcome {
        if tokio::fs::metadata(script).await.is_err() {
            let outcome = DeployOutcome::failed(
                DeployFailureKind::ScriptNotFound,
                format!("deploy script not found: {}", script.display()),
            );
            obs::emit_deploy_finished(&outcome);
            return outcome;
        }

        obs::emit_deploy_started(script);
        let argv = vec![
            self.shell.to_string_lossy().into_owned(),
            script.to_string_lossy().into_owned(),
        ];

        let outcome = match run_with_timeout(&argv, None, self.timeout).await {
            Ok(output) => {
                let succeeded = output.success();
                DeployOutcome {
                    succeeded,
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    failure_kind: (!succeeded).then_some(DeployFailureKind::NonZeroExit),
                }
            }
            Err(e @ ExecError::TimedOut { .. }) => {
                DeployOutcome::failed(DeployFailureKind::TimedOut, e.to_string())
            }
            Err(e) => DeployOutcome::failed(DeployFailureKind::ExecutionError, e.to_string()),
        };

        obs::emit_deploy_finished(&outcome);
        outcome
    }
}
