//! Push-event pipeline orchestration.
//!
//! One run walks a linear state machine:
//!
//! ```text
//! Received -> Classified -> Idle                      (non-push event)
//!                        -> TestsRun -> DeployedOk    (tests passed, deploy succeeded)
//!                                    -> DeployedFail  (tests passed, deploy failed)
//!                                    -> Skipped       (tests failed, no deploy)
//! Received -> Rejected                                (body is not a JSON object)
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::deploy::{DeployOutcome, Deployer, ScriptDeployer};
use crate::error::{PipelineError, Result};
use crate::event::{self, Classification, PushEvent};
use crate::obs;
use crate::runner::{ProcessTestRunner, TestRunVerdict, TestRunner};

/// Pipeline states. The last one reached is reported in [`PipelineOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Classified,
    Idle,
    TestsRun,
    DeployedOk,
    DeployedFail,
    Skipped,
    Rejected,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Received => "received",
            PipelineState::Classified => "classified",
            PipelineState::Idle => "idle",
            PipelineState::TestsRun => "tests_run",
            PipelineState::DeployedOk => "deployed_ok",
            PipelineState::DeployedFail => "deployed_fail",
            PipelineState::Skipped => "skipped",
            PipelineState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Result of one pipeline run. Decides the boundary response; not persisted.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// False only when request intake failed.
    pub event_handled: bool,

    /// True iff the deploy script ran and succeeded.
    pub deployed: bool,

    /// Present iff tests were run.
    pub verdict: Option<TestRunVerdict>,

    /// Present iff the deployer was invoked.
    pub deploy_outcome: Option<DeployOutcome>,

    /// Present iff the event was a push.
    pub push: Option<PushEvent>,

    /// Terminal state.
    pub state: PipelineState,

    /// Intake fault for the responder to surface.
    pub intake_error: Option<PipelineError>,
}

impl PipelineOutcome {
    fn rejected(error: PipelineError) -> Self {
        Self {
            event_handled: false,
            deployed: false,
            verdict: None,
            deploy_outcome: None,
            push: None,
            state: PipelineState::Rejected,
            intake_error: Some(error),
        }
    }

    fn idle() -> Self {
        Self {
            event_handled: true,
            deployed: false,
            verdict: None,
            deploy_outcome: None,
            push: None,
            state: PipelineState::Idle,
            intake_error: None,
        }
    }
}

/// Orchestrates classify, test and deploy for each inbound notification.
pub struct PipelineController {
    config: Arc<PipelineConfig>,
    runner: Arc<dyn TestRunner>,
    deployer: Arc<dyn Deployer>,
    run_lock: Option<Mutex<()>>,
}

impl PipelineController {
    /// Controller backed by real process execution.
    pub fn new(config: PipelineConfig) -> Self {
        let runner = ProcessTestRunner::new(
            config.test_command.clone(),
            config.suite_timeout,
            config.missing_suite_policy,
        );
        let deployer = ScriptDeployer::new(config.deploy_shell.clone(), config.deploy_timeout);
        Self::with_collaborators(config, Arc::new(runner), Arc::new(deployer))
    }

    /// Controller with injected test runner and deployer.
    pub fn with_collaborators(
        config: PipelineConfig,
        runner: Arc<dyn TestRunner>,
        deployer: Arc<dyn Deployer>,
    ) -> Self {
        let run_lock = config.serialize_runs.then(|| Mutex::new(()));
        Self {
            config: Arc::new(config),
            runner,
            deployer,
            run_lock,
        }
    }

    /// Run the pipeline for one raw webhook body.
    ///
    /// Always returns an outcome. Test and deploy failures are recovered here
    /// and only logged; an unreadable body is reported via
    /// [`PipelineOutcome::intake_error`].
    pub async fn handle_payload(&self, raw_body: &[u8], event_type: &str) -> PipelineOutcome {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let span = obs::pipeline_span(&run_id);

        let outcome = self
            .process(raw_body, event_type)
            .instrument(span.clone())
            .await;

        span.in_scope(|| {
            obs::emit_pipeline_finished(
                outcome.state,
                outcome.deployed,
                start.elapsed().as_millis() as u64,
            )
        });
        outcome
    }

    async fn process(&self, raw_body: &[u8], event_type: &str) -> PipelineOutcome {
        let payload = match parse_payload(raw_body) {
            Ok(payload) => payload,
            Err(e) => {
                obs::emit_webhook_rejected(&e);
                return PipelineOutcome::rejected(e);
            }
        };
        obs::emit_webhook_received(event_type, event::repository_name(&payload), raw_body.len());
        debug!(state = %PipelineState::Received, "pipeline state");

        let push = match event::classify(&payload, event_type) {
            Classification::Push(push) => push,
            Classification::NotApplicable => {
                obs::emit_webhook_ignored(event_type);
                return PipelineOutcome::idle();
            }
        };
        obs::emit_push_classified(&push);
        debug!(state = %PipelineState::Classified, "pipeline state");

        let _serial = match &self.run_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let verdict = self
            .runner
            .run(&self.config.suites, &self.config.app_dir)
            .await;
        debug!(state = %PipelineState::TestsRun, "pipeline state");

        if !verdict.all_passed {
            obs::emit_deploy_skipped("tests failed");
            return PipelineOutcome {
                event_handled: true,
                deployed: false,
                verdict: Some(verdict),
                deploy_outcome: None,
                push: Some(push),
                state: PipelineState::Skipped,
                intake_error: None,
            };
        }

        let deploy_outcome = self.deployer.deploy(&self.config.deploy_script).await;
        let deployed = deploy_outcome.succeeded;

        PipelineOutcome {
            event_handled: true,
            deployed,
            verdict: Some(verdict),
            deploy_outcome: Some(deploy_outcome),
            push: Some(push),
            state: if deployed {
                PipelineState::DeployedOk
            } else {
                PipelineState::DeployedFail
            },
            intake_error: None,
        }
    }
}

/// Parse a webhook body into a JSON object.
pub fn parse_payload(raw_body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(raw_body)? {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::PayloadNotObject {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
