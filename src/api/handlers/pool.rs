use crate::api::handlers::ApiState;
use crate::api::types::EventQueryParams;
use crate::pool::{EntrySnapshot, PoolStatus};
use crate::session::SessionFactory;
use crate::telemetry::PoolEvent;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

/// GET /api/pool/status - pool occupancy, utilization and health
pub async fn get_pool_status<F: SessionFactory>(
    State(state): State<ApiState<F>>,
) -> (StatusCode, Json<PoolStatus>) {
    let status = state.pool.status().await;
    (StatusCode::OK, Json(status))
}

/// GET /api/pool/entries - per-entry usage snapshot
pub async fn get_pool_entries<F: SessionFactory>(
    State(state): State<ApiState<F>>,
) -> (StatusCode, Json<Vec<EntrySnapshot>>) {
    (StatusCode::OK, Json(state.pool.entries().await))
}

/// GET /api/pool/events - recent pool lifecycle events
pub async fn get_pool_events<F: SessionFactory>(
    State(state): State<ApiState<F>>,
    Query(params): Query<EventQueryParams>,
) -> (StatusCode, Json<Vec<PoolEvent>>) {
    let telemetry = state.pool.telemetry();
    let events = match params.minutes {
        Some(minutes) if minutes > 0 => telemetry.get_events_since(minutes).await,
        _ => telemetry.get_events().await,
    };
    (StatusCode::OK, Json(events))
}
