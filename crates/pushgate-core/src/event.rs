//! Webhook event classification.

use serde::Serialize;
use serde_json::{Map, Value};

/// Event type label that triggers the pipeline.
pub const PUSH_EVENT: &str = "push";

/// Prefix stripped from `ref` to obtain the branch name.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A push notification worth acting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushEvent {
    pub branch: String,
    pub clone_url: String,
    pub commit_count: usize,
}

/// Result of classifying an inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Push(PushEvent),
    NotApplicable,
}

/// Decide whether a payload is a push event and extract its fields.
///
/// Never fails: absent or mistyped fields degrade to an empty string or zero.
pub fn classify(payload: &Map<String, Value>, event_type: &str) -> Classification {
    if event_type != PUSH_EVENT {
        return Classification::NotApplicable;
    }

    let git_ref = payload.get("ref").and_then(Value::as_str).unwrap_or("");
    let branch = git_ref
        .strip_prefix(BRANCH_REF_PREFIX)
        .unwrap_or(git_ref)
        .to_string();

    let clone_url = payload
        .get("repository")
        .and_then(|repo| repo.get("clone_url"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let commit_count = payload
        .get("commits")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    Classification::Push(PushEvent {
        branch,
        clone_url,
        commit_count,
    })
}

/// Repository `full_name`, used for logging only.
pub fn repository_name(payload: &Map<String, Value>) -> &str {
    payload
        .get("repository")
        .and_then(|repo| repo.get("full_name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}
