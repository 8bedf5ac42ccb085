//! Test suite execution and verdict aggregation.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::ExecError;
use crate::obs;
use crate::process::{run_with_timeout, truncate_chars};
use crate::suite::{MissingSuitePolicy, TestCommand, TestSuiteSpec};

/// Wall-clock limit for one suite.
pub const DEFAULT_SUITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters of stderr kept as the diagnostic for a failed suite.
pub const STDERR_DETAIL_CHARS: usize = 200;

/// Outcome of running one suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteOutcome {
    Passed,
    Failed,
    Missing,
    TimedOut,
    ExecutionError,
}

impl SuiteOutcome {
    /// Whether this outcome blocks deployment regardless of policy.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SuiteOutcome::Failed | SuiteOutcome::TimedOut | SuiteOutcome::ExecutionError
        )
    }

    /// Whether this outcome blocks deployment under `policy`.
    pub fn blocks_deploy(&self, policy: MissingSuitePolicy) -> bool {
        match self {
            SuiteOutcome::Missing => policy == MissingSuitePolicy::Fail,
            other => other.is_failure(),
        }
    }
}

impl fmt::Display for SuiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuiteOutcome::Passed => "passed",
            SuiteOutcome::Failed => "failed",
            SuiteOutcome::Missing => "missing",
            SuiteOutcome::TimedOut => "timed_out",
            SuiteOutcome::ExecutionError => "execution_error",
        };
        f.write_str(s)
    }
}

/// Result of one suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuiteResult {
    /// Suite name.
    pub name: String,

    pub outcome: SuiteOutcome,

    /// Truncated diagnostic; empty for passed suites.
    pub detail: String,
}

impl TestSuiteResult {
    fn new(name: &str, outcome: SuiteOutcome, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            detail: detail.into(),
        }
    }
}

/// Aggregated judgment over all suites in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRunVerdict {
    /// Results in declared suite order.
    pub results: Vec<TestSuiteResult>,

    /// True iff no result blocks deployment.
    pub all_passed: bool,
}

impl TestRunVerdict {
    /// Aggregate results. With [`MissingSuitePolicy::Skip`] a missing suite is
    /// neither pass nor fail, so a run where every suite is missing passes.
    pub fn from_results(results: Vec<TestSuiteResult>, policy: MissingSuitePolicy) -> Self {
        let all_passed = !results.iter().any(|r| r.outcome.blocks_deploy(policy));
        Self {
            results,
            all_passed,
        }
    }

    /// Number of suites with the given outcome.
    pub fn count(&self, outcome: SuiteOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Number of suites that failed, timed out, or could not be executed.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }
}

/// Runs an ordered list of suites against a working directory.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run every suite in order and aggregate. Never fails: each suite's
    /// fault is captured in its result and the remaining suites still run.
    async fn run(&self, suites: &[TestSuiteSpec], working_dir: &Path) -> TestRunVerdict;
}

/// [`TestRunner`] that launches one external process per suite.
#[derive(Debug, Clone)]
pub struct ProcessTestRunner {
    command: TestCommand,
    timeout: Duration,
    missing_policy: MissingSuitePolicy,
}

impl ProcessTestRunner {
    pub fn new(command: TestCommand, timeout: Duration, missing_policy: MissingSuitePolicy) -> Self {
        Self {
            command,
            timeout,
            missing_policy,
        }
    }

    /// Execute a single suite.
    pub async fn run_suite(&self, suite: &TestSuiteSpec, working_dir: &Path) -> TestSuiteResult {
        let path = suite.resolve(working_dir);

        if tokio::fs::metadata(&path).await.is_err() {
            obs::emit_suite_missing(&suite.name, &path);
            return TestSuiteResult::new(
                &suite.name,
                SuiteOutcome::Missing,
                format!("file not found: {}", path.display()),
            );
        }

        obs::emit_suite_started(&suite.name, &path);
        let start = Instant::now();
        let argv = self.command.argv_for(&path);

        let result = match run_with_timeout(&argv, Some(working_dir), self.timeout).await {
            Ok(output) if output.success() => {
                TestSuiteResult::new(&suite.name, SuiteOutcome::Passed, "")
            }
            Ok(output) => TestSuiteResult::new(
                &suite.name,
                SuiteOutcome::Failed,
                truncate_chars(&output.stderr, STDERR_DETAIL_CHARS),
            ),
            Err(e @ ExecError::TimedOut { .. }) => {
                TestSuiteResult::new(&suite.name, SuiteOutcome::TimedOut, e.to_string())
            }
            Err(e) => {
                TestSuiteResult::new(&suite.name, SuiteOutcome::ExecutionError, e.to_string())
            }
        };

        obs::emit_suite_finished(&result, start.elapsed().as_millis() as u64);
        result
    }
}

#[async_trait]
impl TestRunner for ProcessTestRunner {
    async fn run(&self, suites: &[TestSuiteSpec], working_dir: &Path) -> TestRunVerdict {
        // Sequential: the verdict must be complete and deterministic before deploy.
        let mut results = Vec::with_capacity(suites.len());
        for suite in suites {
            results.push(self.run_suite(suite, working_dir).await);
        }

        let verdict = TestRunVerdict::from_results(results, self.missing_policy);
        obs::emit_tests_verdict(&verdict);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::FILE_PLACEHOLDER;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    fn result(outcome: SuiteOutcome) -> TestSuiteResult {
        TestSuiteResult::new("suite", outcome, "")
    }

    fn sh_runner(timeout: Duration, policy: MissingSuitePolicy) -> ProcessTestRunner {
        ProcessTestRunner::new(
            TestCommand::new("sh", vec![FILE_PLACEHOLDER.to_string()]),
            timeout,
            policy,
        )
    }

    fn write_suite(dir: &Path, rel: &str, body: &str) -> TestSuiteSpec {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, body).expect("write suite");
        TestSuiteSpec::new(rel, PathBuf::from(rel))
    }

    #[test]
    fn test_verdict_all_passed() {
        let verdict = TestRunVerdict::from_results(
            vec![result(SuiteOutcome::Passed), result(SuiteOutcome::Passed)],
            MissingSuitePolicy::Skip,
        );
        assert!(verdict.all_passed);
        assert_eq!(verdict.count(SuiteOutcome::Passed), 2);
        assert_eq!(verdict.failed_count(), 0);
    }

    #[test]
    fn test_verdict_any_failure_blocks() {
        for failing in [
            SuiteOutcome::Failed,
            SuiteOutcome::TimedOut,
            SuiteOutcome::ExecutionError,
        ] {
            let verdict = TestRunVerdict::from_results(
                vec![result(SuiteOutcome::Passed), result(failing)],
                MissingSuitePolicy::Skip,
            );
            assert!(!verdict.all_passed, "{failing} must block deploy");
            assert_eq!(verdict.failed_count(), 1);
        }
    }

    #[test]
    fn test_verdict_missing_is_skipped_by_default() {
        let verdict = TestRunVerdict::from_results(
            vec![result(SuiteOutcome::Missing), result(SuiteOutcome::Passed)],
            MissingSuitePolicy::Skip,
        );
        assert!(verdict.all_passed);
        assert_eq!(verdict.failed_count(), 0);
    }

    #[test]
    fn test_verdict_all_missing_still_passes() {
        let verdict = TestRunVerdict::from_results(
            vec![result(SuiteOutcome::Missing), result(SuiteOutcome::Missing)],
            MissingSuitePolicy::Skip,
        );
        assert!(verdict.all_passed);
    }

    #[test]
    fn test_verdict_missing_blocks_under_fail_policy() {
        let verdict = TestRunVerdict::from_results(
            vec![result(SuiteOutcome::Missing), result(SuiteOutcome::Passed)],
            MissingSuitePolicy::Fail,
        );
        assert!(!verdict.all_passed);
    }

    #[test]
    fn test_verdict_empty_suite_list_passes() {
        let verdict = TestRunVerdict::from_results(vec![], MissingSuitePolicy::Skip);
        assert!(verdict.all_passed);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SuiteOutcome::TimedOut.to_string(), "timed_out");
        assert_eq!(SuiteOutcome::ExecutionError.to_string(), "execution_error");
    }

    #[tokio::test]
    async fn test_run_suites_in_order_collecting_all() {
        let dir = tempfile::tempdir().expect("tempdir");
        let suites = vec![
            write_suite(dir.path(), "tests/a.sh", "exit 1\n"),
            write_suite(dir.path(), "tests/b.sh", "exit 0\n"),
            TestSuiteSpec::new("absent", "tests/absent.sh"),
        ];

        let runner = sh_runner(Duration::from_secs(10), MissingSuitePolicy::Skip);
        let verdict = runner.run(&suites, dir.path()).await;

        let outcomes: Vec<_> = verdict.results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                SuiteOutcome::Failed,
                SuiteOutcome::Passed,
                SuiteOutcome::Missing
            ]
        );
        assert!(!verdict.all_passed);
    }

    #[tokio::test]
    async fn test_failed_detail_is_truncated_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let noise = "x".repeat(500);
        let suite = write_suite(
            dir.path(),
            "tests/noisy.sh",
            &format!("echo {noise} >&2\nexit 2\n"),
        );

        let runner = sh_runner(Duration::from_secs(10), MissingSuitePolicy::Skip);
        let result = runner.run_suite(&suite, dir.path()).await;

        assert_eq!(result.outcome, SuiteOutcome::Failed);
        assert_eq!(result.detail.chars().count(), STDERR_DETAIL_CHARS);
        assert!(result.detail.chars().all(|c| c == 'x'));
    }

    #[tokio::test]
    async fn test_suite_runs_in_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("marker.txt"), "here").expect("write marker");
        let suite = write_suite(dir.path(), "tests/cwd.sh", "test -f marker.txt\n");

        let runner = sh_runner(Duration::from_secs(10), MissingSuitePolicy::Skip);
        let result = runner.run_suite(&suite, dir.path()).await;
        assert_eq!(result.outcome, SuiteOutcome::Passed);
    }

    #[tokio::test]
    async fn test_suite_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let suite = write_suite(dir.path(), "tests/slow.sh", "sleep 30\n");

        let runner = sh_runner(Duration::from_secs(1), MissingSuitePolicy::Skip);
        let verdict = runner.run(&[suite], dir.path()).await;

        assert_eq!(verdict.results[0].outcome, SuiteOutcome::TimedOut);
        assert!(!verdict.all_passed);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_execution_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let suite = write_suite(dir.path(), "tests/a.sh", "exit 0\n");

        let runner = ProcessTestRunner::new(
            TestCommand::new(
                "pushgate-no-such-interpreter",
                vec![FILE_PLACEHOLDER.to_string()],
            ),
            Duration::from_secs(5),
            MissingSuitePolicy::Skip,
        );
        let verdict = runner.run(&[suite], dir.path()).await;

        assert_eq!(verdict.results[0].outcome, SuiteOutcome::ExecutionError);
        assert!(verdict.results[0].detail.contains("pushgate-no-such-interpreter"));
        assert!(!verdict.all_passed);
    }

    #[tokio::test]
    async fn test_all_missing_passes_under_skip_and_fails_under_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let suites = vec![
            TestSuiteSpec::new("unit", "tests/test_unit.py"),
            TestSuiteSpec::new("api", "tests/test_api.py"),
        ];

        let lenient = sh_runner(Duration::from_secs(5), MissingSuitePolicy::Skip);
        assert!(lenient.run(&suites, dir.path()).await.all_passed);

        let strict = sh_runner(Duration::from_secs(5), MissingSuitePolicy::Fail);
        assert!(!strict.run(&suites, dir.path()).await.all_passed);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_run_logs_each_suite_and_verdict() {
        let dir = tempfile::tempdir().expect("tempdir");
        let suites = vec![
            write_suite(dir.path(), "tests/present.sh", "echo boom >&2\nexit 1\n"),
            TestSuiteSpec::new("absent", "tests/absent.sh"),
        ];

        let runner = sh_runner(Duration::from_secs(10), MissingSuitePolicy::Skip);
        runner.run(&suites, dir.path()).await;

        assert!(logs_contain("suite.started"));
        assert!(logs_contain("suite.finished"));
        assert!(logs_contain("suite.missing"));
        assert!(logs_contain("tests.verdict"));
        assert!(logs_contain("tests/present.sh"));
        assert!(logs_contain("boom"));
        assert!(logs_contain("all_passed=false"));
    }
}
