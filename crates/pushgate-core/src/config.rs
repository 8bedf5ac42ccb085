//! Process-wide pipeline configuration, fixed at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::{DEFAULT_DEPLOY_SHELL, DEFAULT_DEPLOY_TIMEOUT};
use crate::error::ConfigError;
use crate::runner::DEFAULT_SUITE_TIMEOUT;
use crate::suite::{MissingSuitePolicy, TestCommand, TestSuiteSpec};

pub const DEFAULT_APP_DIR: &str = "/home/alex/catty-reminders-app";
pub const DEFAULT_DEPLOY_SCRIPT: &str = "/home/alex/deploy.sh";

/// Immutable configuration handed to the pipeline controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Application directory; suites resolve under it and run with it as cwd.
    pub app_dir: PathBuf,

    /// Deploy script path.
    pub deploy_script: PathBuf,

    /// Interpreter used to run the deploy script.
    pub deploy_shell: PathBuf,

    /// Suites, in execution order.
    pub suites: Vec<TestSuiteSpec>,

    pub test_command: TestCommand,

    pub suite_timeout: Duration,

    pub deploy_timeout: Duration,

    pub missing_suite_policy: MissingSuitePolicy,

    /// Queue overlapping pipeline runs instead of letting them interleave.
    pub serialize_runs: bool,
}

impl PipelineConfig {
    /// Configuration with default suites, command and timeouts.
    pub fn new(app_dir: impl Into<PathBuf>, deploy_script: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            deploy_script: deploy_script.into(),
            deploy_shell: PathBuf::from(DEFAULT_DEPLOY_SHELL),
            suites: TestSuiteSpec::defaults(),
            test_command: TestCommand::default(),
            suite_timeout: DEFAULT_SUITE_TIMEOUT,
            deploy_timeout: DEFAULT_DEPLOY_TIMEOUT,
            missing_suite_policy: MissingSuitePolicy::default(),
            serialize_runs: false,
        }
    }

    pub fn with_suites(mut self, suites: Vec<TestSuiteSpec>) -> Self {
        self.suites = suites;
        self
    }

    pub fn with_test_command(mut self, command: TestCommand) -> Self {
        self.test_command = command;
        self
    }

    pub fn with_deploy_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.deploy_shell = shell.into();
        self
    }

    pub fn with_timeouts(mut self, suite: Duration, deploy: Duration) -> Self {
        self.suite_timeout = suite;
        self.deploy_timeout = deploy;
        self
    }

    pub fn with_missing_suite_policy(mut self, policy: MissingSuitePolicy) -> Self {
        self.missing_suite_policy = policy;
        self
    }

    pub fn serialized(mut self, serialize_runs: bool) -> Self {
        self.serialize_runs = serialize_runs;
        self
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.test_command.validate()?;
        if self.suite_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { what: "suite" });
        }
        if self.deploy_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { what: "deploy" });
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_APP_DIR, DEFAULT_DEPLOY_SCRIPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.app_dir, PathBuf::from(DEFAULT_APP_DIR));
        assert_eq!(config.deploy_script, PathBuf::from(DEFAULT_DEPLOY_SCRIPT));
        assert_eq!(config.deploy_shell, PathBuf::from("/bin/bash"));
        assert_eq!(config.suite_timeout, Duration::from_secs(60));
        assert_eq!(config.deploy_timeout, Duration::from_secs(120));
        assert_eq!(config.suites.len(), 2);
        assert_eq!(config.missing_suite_policy, MissingSuitePolicy::Skip);
        assert!(!config.serialize_runs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = PipelineConfig::default().with_timeouts(Duration::ZERO, Duration::from_secs(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout { what: "suite" })
        ));

        let config = PipelineConfig::default().with_timeouts(Duration::from_secs(1), Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout { what: "deploy" })
        ));
    }

    #[test]
    fn test_invalid_command_rejected() {
        let config =
            PipelineConfig::default().with_test_command(TestCommand::new("pytest", vec![]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFilePlaceholder)
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::new("/srv/app", "/srv/deploy.sh")
            .with_suites(vec![TestSuiteSpec::new("smoke", "smoke.sh")])
            .with_missing_suite_policy(MissingSuitePolicy::Fail)
            .serialized(true);
        assert_eq!(config.suites[0].name, "smoke");
        assert_eq!(config.missing_suite_policy, MissingSuitePolicy::Fail);
        assert!(config.serialize_runs);
    }
}
