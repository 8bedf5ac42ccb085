//! Pushgate Core - push-triggered test-and-deploy pipeline
//!
//! Provides the pipeline the webhook daemon drives for every notification:
//! - Classifies the event; only `push` proceeds
//! - Runs the configured test suites in order, each with a timeout
//! - Invokes the deploy script once, only if every present suite passed
//! - Reports a typed outcome; test and deploy failures never escape as errors

pub mod config;
pub mod deploy;
pub mod error;
pub mod event;
pub mod fakes;
pub mod obs;
pub mod pipeline;
pub mod process;
pub mod runner;
pub mod suite;
pub mod telemetry;

// Re-export key types
pub use config::PipelineConfig;
pub use deploy::{DeployFailureKind, DeployOutcome, Deployer, ScriptDeployer};
pub use error::{ConfigError, ExecError, PipelineError};
pub use event::{classify, Classification, PushEvent};
pub use pipeline::{parse_payload, PipelineController, PipelineOutcome, PipelineState};
pub use runner::{ProcessTestRunner, SuiteOutcome, TestRunVerdict, TestRunner, TestSuiteResult};
pub use suite::{MissingSuitePolicy, TestCommand, TestSuiteSpec};
pub use telemetry::init_tracing;
