//! Error taxonomy for the push-event pipeline.
//!
//! Only [`PipelineError`] ever reaches the HTTP boundary. Process and
//! configuration errors are either recovered into typed outcomes or fail the
//! daemon at startup.

/// Request-intake failures. These are the only faults that become an HTTP
/// error response.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("payload must be a JSON object, got {found}")]
    PayloadNotObject { found: &'static str },

    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

/// Failures of a bounded child-process execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("process timed out after {limit_secs}s")]
    TimedOut { limit_secs: u64 },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("command has no program")]
    EmptyCommand,
}

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid suite spec {0:?}: expected NAME=RELATIVE_PATH")]
    InvalidSuiteSpec(String),

    #[error("test command program must not be empty")]
    EmptyTestCommand,

    #[error("test command arguments must contain the {{file}} placeholder")]
    MissingFilePlaceholder,

    #[error("{what} timeout must be greater than zero")]
    ZeroTimeout { what: &'static str },

    #[error("unknown missing-suite policy {0:?}: expected skip or fail")]
    UnknownMissingSuitePolicy(String),
}

/// Result type for request intake.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_payload_carries_parser_text() {
        let parse_err = serde_json::from_slice::<serde_json::Value>(b"{not json")
            .expect_err("must fail to parse");
        let expected = parse_err.to_string();
        let err = PipelineError::from(parse_err);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_not_object_names_the_found_type() {
        let err = PipelineError::PayloadNotObject { found: "array" };
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_exec_timeout_display() {
        let err = ExecError::TimedOut { limit_secs: 60 };
        assert_eq!(err.to_string(), "process timed out after 60s");
    }

    #[test]
    fn test_config_placeholder_display() {
        let err = ConfigError::MissingFilePlaceholder;
        assert!(err.to_string().contains("{file}"));
    }
}
