//! HTTP gateway: binds the configured address and serves [`api::create_router`].

pub mod api;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::ServerConfig;
use crate::pipeline::PipelineOrchestrator;

pub use api::{create_router, ApiError, ApiState};

/// Serve the API until Ctrl-C.
pub async fn serve(config: &ServerConfig, orchestrator: Arc<PipelineOrchestrator>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    log::info!("server: listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(ApiState::new(orchestrator)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("server: shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("server: cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
