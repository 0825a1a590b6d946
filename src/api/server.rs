use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{
    execute_prompt, get_metrics, get_pool_entries, get_pool_events, get_pool_status,
    health_check, ApiState,
};
use crate::config::ApiSettings;
use crate::session::{PromptSession, SessionFactory};
use crate::utils::error::{Result, WarmPoolError};

/// Build the router with all endpoints
pub fn build_router<F>(state: ApiState<F>) -> Router
where
    F: SessionFactory,
    F::Session: PromptSession,
{
    Router::new()
        // Health and metrics
        .route("/health", get(health_check::<F>))
        .route("/metrics", get(get_metrics::<F>))
        // Pool endpoints
        .route("/api/pool/status", get(get_pool_status::<F>))
        .route("/api/pool/entries", get(get_pool_entries::<F>))
        .route("/api/pool/events", get(get_pool_events::<F>))
        // Execution
        .route("/api/execute", post(execute_prompt::<F>))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB max body
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the REST API server; returns once `shutdown` is cancelled.
pub async fn start_api_server<F>(
    settings: &ApiSettings,
    state: ApiState<F>,
    shutdown: CancellationToken,
) -> Result<()>
where
    F: SessionFactory,
    F::Session: PromptSession,
{
    if !settings.enabled {
        info!("API server disabled");
        shutdown.cancelled().await;
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", settings.bind_address, settings.bind_port)
        .parse()
        .map_err(|e| WarmPoolError::Config(format!("Invalid bind address: {}", e)))?;

    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
