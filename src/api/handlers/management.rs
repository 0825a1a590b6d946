use crate::api::handlers::ApiState;
use crate::api::types::HealthResponse;
use crate::session::SessionFactory;
use axum::{extract::State, http::StatusCode, Json};

/// GET /health - Health check endpoint
pub async fn health_check<F: SessionFactory>(
    State(state): State<ApiState<F>>,
) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "warmpool".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    (StatusCode::OK, Json(response))
}

/// GET /metrics - Prometheus metrics endpoint
#[cfg(feature = "metrics")]
pub async fn get_metrics<F: SessionFactory>(
    State(state): State<ApiState<F>>,
) -> (StatusCode, String) {
    use prometheus::{Encoder, TextEncoder};

    // Refresh gauges so a scrape right after startup is accurate.
    crate::pool::PoolMetrics::record_occupancy(&state.pool.stats().await);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {}", err),
        );
    }

    match String::from_utf8(buffer) {
        Ok(text) => (StatusCode::OK, text),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics are not valid UTF-8: {}", err),
        ),
    }
}

/// GET /metrics - pool gauges in Prometheus text format
#[cfg(not(feature = "metrics"))]
pub async fn get_metrics<F: SessionFactory>(
    State(state): State<ApiState<F>>,
) -> (StatusCode, String) {
    let stats = state.pool.stats().await;

    let metrics = format!(
        "# HELP warmpool_sessions_available Number of idle sessions ready to be acquired\n\
         # TYPE warmpool_sessions_available gauge\n\
         warmpool_sessions_available {}\n\
         # HELP warmpool_sessions_in_use Number of sessions currently checked out\n\
         # TYPE warmpool_sessions_in_use gauge\n\
         warmpool_sessions_in_use {}\n",
        stats.available, stats.in_use
    );

    (StatusCode::OK, metrics)
}
