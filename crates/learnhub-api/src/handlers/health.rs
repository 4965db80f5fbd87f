//! Health check handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let uptime = (Utc::now() - state.started_at).num_seconds().max(0);
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: u64::try_from(uptime).unwrap_or(0),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let database = match state.stores.health_check().await {
        Ok(true) => "connected",
        Ok(false) => "degraded",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "unavailable"
        }
    };

    let status = if database == "connected" { "ok" } else { "degraded" };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        backend: state.stores.backend_name().to_string(),
        database: database.to_string(),
        ws_connections: state.realtime.connections.connection_count(),
        connected_users: state.realtime.connections.user_count(),
        channels: state.realtime.channels.channel_count(),
        sweeps: state.sweeps.registered_names(),
    }))
}
