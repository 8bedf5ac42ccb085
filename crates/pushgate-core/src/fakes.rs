//! In-memory fakes for the runner and deployer traits (testing only)
//!
//! Provides `FakeTestRunner` and `FakeDeployer`, which return canned results
//! and count how often the pipeline invoked them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::deploy::{DeployFailureKind, DeployOutcome, Deployer};
use crate::runner::{SuiteOutcome, TestRunVerdict, TestRunner, TestSuiteResult};
use crate::suite::{MissingSuitePolicy, TestSuiteSpec};

// ---------------------------------------------------------------------------
// FakeTestRunner
// ---------------------------------------------------------------------------

/// Test runner that assigns canned outcomes to suites.
///
/// Outcome `i` applies to whatever suite is `i`th in the run; the number of
/// results follows the canned list, not the configured suites.
#[derive(Debug, Default)]
pub struct FakeTestRunner {
    outcomes: Vec<SuiteOutcome>,
    policy: MissingSuitePolicy,
    delay: Option<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeTestRunner {
    pub fn with_outcomes(outcomes: Vec<SuiteOutcome>) -> Self {
        Self {
            outcomes,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: MissingSuitePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sleep this long inside every run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of runs observed in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestRunner for FakeTestRunner {
    async fn run(&self, suites: &[TestSuiteSpec], _working_dir: &Path) -> TestRunVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let results = self
            .outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| TestSuiteResult {
                name: suites
                    .get(i)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| format!("suite-{i}")),
                outcome: *outcome,
                detail: String::new(),
            })
            .collect();

        self.active.fetch_sub(1, Ordering::SeqCst);
        TestRunVerdict::from_results(results, self.policy)
    }
}

// ---------------------------------------------------------------------------
// FakeDeployer
// ---------------------------------------------------------------------------

/// Deployer that records each script it was asked to run.
#[derive(Debug)]
pub struct FakeDeployer {
    outcome: DeployOutcome,
    calls: AtomicUsize,
    scripts: Mutex<Vec<PathBuf>>,
}

impl FakeDeployer {
    pub fn succeeding() -> Self {
        Self::returning(DeployOutcome {
            succeeded: true,
            exit_code: Some(0),
            stdout: "deployed".to_string(),
            stderr: String::new(),
            failure_kind: None,
        })
    }

    pub fn failing(kind: DeployFailureKind) -> Self {
        Self::returning(DeployOutcome::failed(kind, "fake deploy failure"))
    }

    pub fn returning(outcome: DeployOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn scripts(&self) -> Vec<PathBuf> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deployer for FakeDeployer {
    async fn deploy(&self, script: &Path) -> DeployOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripts.lock().unwrap().push(script.to_path_buf());
        self.outcome.clone()
    }
}
