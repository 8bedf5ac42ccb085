//! Tracing initialisation for Pushgate binaries.
//!
//! The filter comes from `PUSHGATE_LOG`, then `RUST_LOG`, then the level
//! passed by the caller. Later calls to [`init_tracing`] are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Daemon-specific filter variable; takes precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "PUSHGATE_LOG";

/// Filter directives used when neither environment variable is set.
///
/// Per-request lines from `tower_http` only appear at debug verbosity, so the
/// default output is the pipeline's own lifecycle events.
pub fn default_directives(level: Level) -> String {
    if level >= Level::DEBUG {
        format!("{level},tower_http=debug").to_lowercase()
    } else {
        format!("{level},tower_http=warn").to_lowercase()
    }
}

fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber.
///
/// With `json` set, every line is one flat JSON object whose fields include
/// the `event` name and the enclosing `pipeline.run` span's `run_id`.
pub fn init_tracing(json: bool, level: Level) {
    let registry = tracing_subscriber::registry().with(build_filter(level));

    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    installed.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_http_at_info() {
        assert_eq!(default_directives(Level::INFO), "info,tower_http=warn");
        assert_eq!(default_directives(Level::WARN), "warn,tower_http=warn");
    }

    #[test]
    fn test_default_directives_verbose_includes_http() {
        assert_eq!(default_directives(Level::DEBUG), "debug,tower_http=debug");
        assert_eq!(default_directives(Level::TRACE), "trace,tower_http=debug");
    }

    #[test]
    fn test_default_directives_parse() {
        for level in [Level::INFO, Level::DEBUG] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
    }
}
