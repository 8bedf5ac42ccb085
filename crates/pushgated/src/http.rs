//! HTTP surface: status page on GET, webhook intake on POST.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use pushgate_core::{obs, PipelineController, PipelineError, PipelineOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::status;

/// Header carrying the webhook event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Event type assumed when the header is absent.
pub const UNKNOWN_EVENT: &str = "unknown";

/// Largest webhook body accepted.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for all handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PipelineController>,

    /// Port reported on the status page.
    pub port: u16,
}

impl AppState {
    pub fn new(controller: Arc<PipelineController>, port: u16) -> Self {
        Self { controller, port }
    }
}

/// JSON body of every webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

impl WebhookResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "Webhook processed".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// GET and POST on any path.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status_page).post(webhook))
        .route("/{*path}", get(status_page).post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status_page(State(state): State<AppState>) -> Html<String> {
    Html(status::render(state.port, Local::now()))
}

async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Body) -> Response {
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = PipelineError::BodyRead(e.to_string());
            obs::emit_webhook_rejected(&err);
            return error_response(&err);
        }
    };

    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN_EVENT)
        .to_string();

    // Spawned so that a client disconnect cannot cancel tests or deploy mid-run.
    let controller = Arc::clone(&state.controller);
    let task =
        tokio::spawn(async move { controller.handle_payload(&bytes, &event_type).await });

    match task.await {
        Ok(outcome) => respond(&outcome),
        Err(e) => {
            tracing::error!(error = %e, "pipeline task failed");
            error_response(&e)
        }
    }
}

/// Map a pipeline outcome to the HTTP response.
///
/// Test and deploy failures still answer 200; only intake faults answer 500.
pub fn respond(outcome: &PipelineOutcome) -> Response {
    match &outcome.intake_error {
        Some(e) => error_response(e),
        None => (StatusCode::OK, Json(WebhookResponse::success())).into_response(),
    }
}

fn error_response(error: &dyn std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(WebhookResponse::error(error.to_string())),
    )
        .into_response()
}
