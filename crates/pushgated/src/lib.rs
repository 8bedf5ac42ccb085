//! Pushgate daemon - HTTP front end for the push pipeline.

use std::future::Future;
use tokio::net::TcpListener;

pub mod cli;
pub mod http;
pub mod status;

pub use http::{router, AppState, WebhookResponse};

/// Serve until `shutdown` resolves, then stop accepting connections and
/// let in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
