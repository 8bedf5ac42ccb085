//! pushgated - push webhook listener that tests and deploys.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use pushgate_core::PipelineController;
use pushgated::cli::Cli;
use pushgated::{status, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    pushgate_core::init_tracing(cli.json, level);

    let config = cli.pipeline_config().context("invalid configuration")?;

    let addr = cli.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    let port = local_addr.port();

    let started_at = Local::now().format(status::TIME_FORMAT).to_string();
    let suites: Vec<String> = config.suites.iter().map(|s| s.to_string()).collect();
    info!(
        port = port,
        started_at = %started_at,
        app_dir = %config.app_dir.display(),
        deploy_script = %config.deploy_script.display(),
        suites = ?suites,
        serialize_runs = config.serialize_runs,
        "pushgated starting"
    );

    let state = AppState::new(Arc::new(PipelineController::new(config)), port);

    info!("listening on http://{}", local_addr);
    pushgated::serve(listener, state, shutdown_signal()).await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
