//! Structured lifecycle events for the push-event pipeline.
//!
//! Every event carries an `event = "<name>"` field so log aggregation can
//! filter on it. Successful steps log at `info!`, failures at `warn!`.
//! Set `RUST_LOG` to adjust verbosity; pass `--json` to the daemon for JSON lines.

use tracing::{info, warn};

use crate::deploy::DeployOutcome;
use crate::event::PushEvent;
use crate::pipeline::PipelineState;
use crate::runner::{SuiteOutcome, TestRunVerdict, TestSuiteResult};

/// Span that groups one pipeline run's log lines.
///
/// Attach with `tracing::Instrument` so it follows the run across awaits:
///
/// ```ignore
/// controller.run(..).instrument(pipeline_span(&run_id)).await
/// ```
pub fn pipeline_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("pipeline.run", run_id = %run_id)
}

/// Emit event: a webhook body was parsed, with its event type and repository.
pub fn emit_webhook_received(event_type: &str, repository: &str, body_len: usize) {
    info!(
        event = "webhook.received",
        event_type = %event_type,
        repository = %repository,
        body_len = body_len,
    );
}

/// Emit event: the event type is not `push`, so nothing runs.
pub fn emit_webhook_ignored(event_type: &str) {
    info!(event = "webhook.ignored", event_type = %event_type, "ignoring non-push event");
}

/// Emit event: the body could not be read or is not a JSON object.
pub fn emit_webhook_rejected(error: &dyn std::fmt::Display) {
    warn!(event = "webhook.rejected", error = %error);
}

/// Emit event: push accepted, with branch, commit count and clone URL.
pub fn emit_push_classified(push: &PushEvent) {
    info!(
        event = "push.classified",
        branch = %push.branch,
        commit_count = push.commit_count,
        clone_url = %push.clone_url,
    );
}

/// Emit event: suite file absent under the working directory.
pub fn emit_suite_missing(suite: &str, path: &std::path::Path) {
    warn!(event = "suite.missing", suite = %suite, path = %path.display(), "suite file not found");
}

/// Emit event: suite process launched.
pub fn emit_suite_started(suite: &str, path: &std::path::Path) {
    info!(event = "suite.started", suite = %suite, path = %path.display());
}

/// Emit event: suite finished. Failures log at `warn!` with the stderr detail.
pub fn emit_suite_finished(result: &TestSuiteResult, duration_ms: u64) {
    if result.outcome.is_failure() {
        warn!(
            event = "suite.finished",
            suite = %result.name,
            outcome = %result.outcome,
            duration_ms = duration_ms,
            detail = %result.detail,
        );
    } else {
        info!(
            event = "suite.finished",
            suite = %result.name,
            outcome = %result.outcome,
            duration_ms = duration_ms,
        );
    }
}

/// Emit event: aggregated verdict over all suites of one run.
pub fn emit_tests_verdict(verdict: &TestRunVerdict) {
    info!(
        event = "tests.verdict",
        all_passed = verdict.all_passed,
        passed = verdict.count(SuiteOutcome::Passed),
        failed = verdict.failed_count(),
        missing = verdict.count(SuiteOutcome::Missing),
    );
}

/// Emit event: deploy not attempted.
pub fn emit_deploy_skipped(reason: &str) {
    warn!(event = "deploy.skipped", reason = %reason);
}

/// Emit event: deploy script launched.
pub fn emit_deploy_started(script: &std::path::Path) {
    info!(event = "deploy.started", script = %script.display());
}

/// Emit event: deploy finished, with stdout on success or failure kind and stderr otherwise.
pub fn emit_deploy_finished(outcome: &DeployOutcome) {
    if outcome.succeeded {
        info!(
            event = "deploy.finished",
            succeeded = true,
            exit_code = ?outcome.exit_code,
            stdout = %outcome.stdout,
        );
    } else {
        warn!(
            event = "deploy.finished",
            succeeded = false,
            exit_code = ?outcome.exit_code,
            failure_kind = ?outcome.failure_kind,
            stderr = %outcome.stderr,
        );
    }
}

/// Emit event: run reached its terminal state.
pub fn emit_pipeline_finished(state: PipelineState, deployed: bool, duration_ms: u64) {
    info!(
        event = "pipeline.finished",
        state = %state,
        deployed = deployed,
        duration_ms = duration_ms,
    );
}
