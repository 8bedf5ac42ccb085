//! Command-line and environment configuration.

use clap::Parser;
use pushgate_core::config::{DEFAULT_APP_DIR, DEFAULT_DEPLOY_SCRIPT};
use pushgate_core::deploy::DEFAULT_DEPLOY_SHELL;
use pushgate_core::{ConfigError, MissingSuitePolicy, PipelineConfig, TestCommand, TestSuiteSpec};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pushgated")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Runs tests on every push webhook and deploys when they pass", long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "PUSHGATE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PUSHGATE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Application directory: suites resolve under it and run in it
    #[arg(long, env = "PUSHGATE_APP_DIR", default_value = DEFAULT_APP_DIR)]
    pub app_dir: PathBuf,

    /// Deploy script invoked after all suites pass
    #[arg(long, env = "PUSHGATE_DEPLOY_SCRIPT", default_value = DEFAULT_DEPLOY_SCRIPT)]
    pub deploy_script: PathBuf,

    /// Shell used to run the deploy script
    #[arg(long, env = "PUSHGATE_DEPLOY_SHELL", default_value = DEFAULT_DEPLOY_SHELL)]
    pub deploy_shell: PathBuf,

    /// Test suite as NAME=RELATIVE_PATH, repeatable, run in the given order
    #[arg(long = "suite", value_name = "NAME=PATH")]
    pub suites: Vec<TestSuiteSpec>,

    /// Program that executes one suite file
    #[arg(long, default_value = "python3")]
    pub test_program: String,

    /// Argument to the test program, repeatable; {file} is the suite path
    #[arg(long = "test-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub test_args: Vec<String>,

    /// Per-suite timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub suite_timeout_secs: u64,

    /// Deploy script timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub deploy_timeout_secs: u64,

    /// What a missing suite file means: skip or fail
    #[arg(long, default_value = "skip")]
    pub missing_suite_policy: MissingSuitePolicy,

    /// Queue overlapping pipeline runs instead of running them concurrently
    #[arg(long)]
    pub serialize_runs: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Build and validate the pipeline configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let suites = if self.suites.is_empty() {
            TestSuiteSpec::defaults()
        } else {
            self.suites.clone()
        };

        let mut command = TestCommand::default();
        command.program = self.test_program.clone();
        if !self.test_args.is_empty() {
            command.args = self.test_args.clone();
        }

        let config = PipelineConfig::new(&self.app_dir, &self.deploy_script)
            .with_deploy_shell(&self.deploy_shell)
            .with_suites(suites)
            .with_test_command(command)
            .with_timeouts(
                Duration::from_secs(self.suite_timeout_secs),
                Duration::from_secs(self.deploy_timeout_secs),
            )
            .with_missing_suite_policy(self.missing_suite_policy)
            .serialized(self.serialize_runs);

        config.validate()?;
        Ok(config)
    }
}
