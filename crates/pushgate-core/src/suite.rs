//! Test suite definitions and the command used to execute them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Placeholder in [`TestCommand::args`] replaced by the resolved suite path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// A named, file-backed group of tests executed as one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuiteSpec {
    /// Human-readable suite name.
    pub name: String,

    /// Suite file, relative to the application directory.
    pub relative_path: PathBuf,
}

impl TestSuiteSpec {
    pub fn new(name: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Resolve the suite file under `working_dir`.
    pub fn resolve(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.relative_path)
    }

    /// Suites the daemon runs when none are configured.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Unit тесты", "tests/test_unit.py"),
            Self::new("API тесты", "tests/test_api.py"),
        ]
    }
}

/// Parses `NAME=RELATIVE_PATH`.
impl FromStr for TestSuiteSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidSuiteSpec(s.to_string()))?;
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return Err(ConfigError::InvalidSuiteSpec(s.to_string()));
        }
        Ok(Self::new(name, path))
    }
}

impl fmt::Display for TestSuiteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.relative_path.display())
    }
}

/// Command template for running one suite file in verbose mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCommand {
    /// Executable to launch.
    pub program: String,

    /// Arguments; [`FILE_PLACEHOLDER`] is substituted with the suite path.
    pub args: Vec<String>,
}

impl TestCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Full argv for a concrete suite file.
    pub fn argv_for(&self, suite_file: &Path) -> Vec<String> {
        let file = suite_file.to_string_lossy();
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &file)));
        argv
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::EmptyTestCommand);
        }
        if !self.args.iter().any(|a| a.contains(FILE_PLACEHOLDER)) {
            return Err(ConfigError::MissingFilePlaceholder);
        }
        Ok(())
    }
}

/// `python3 -m pytest {file} -v`
impl Default for TestCommand {
    fn default() -> Self {
        Self::new(
            "python3",
            vec![
                "-m".to_string(),
                "pytest".to_string(),
                FILE_PLACEHOLDER.to_string(),
                "-v".to_string(),
            ],
        )
    }
}

/// How an absent suite file affects the verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSuitePolicy {
    /// Missing suites are skipped and do not block deployment.
    #[default]
    Skip,

    /// Missing suites count as failures.
    Fail,
}

impl FromStr for MissingSuitePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            _ => Err(ConfigError::UnknownMissingSuitePolicy(s.to_string())),
        }
    }
}
