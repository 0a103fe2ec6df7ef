use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use aicademics_backend::core;
use aicademics_backend::core::config::AppPaths;
use aicademics_backend::server;
use aicademics_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    core::logging::init(&paths);
    let state = AppState::initialize(paths).await?;

    match state.config.load_config() {
        Ok(config) => tracing::debug!(
            "Effective configuration: {}",
            state.config.redact_sensitive_values(&config)
        ),
        Err(err) => tracing::warn!("Failed to reload configuration for logging: {}", err),
    }

    match state.llm().health_check().await {
        Ok(true) => tracing::info!("Completion service reachable ({})", state.llm().model()),
        Ok(false) | Err(_) => tracing::warn!(
            "Completion service not reachable at startup; requests will report errors until it is"
        ),
    }

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!(
        "Listening on {} (retrieval {})",
        addr,
        if state.pipeline.retrieval_available() {
            "enabled"
        } else {
            "unavailable"
        }
    );

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
