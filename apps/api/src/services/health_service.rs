//! Health check handler.
//!
//! Used by load balancers and the mobile client's "server reachable" probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: String,
    pub database: bool,
    pub pending_migrations: usize,
    pub version: String,
    pub server_time: DateTime<Utc>,
}

/// `GET /api/health`
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let pending_migrations = state.db.pending_migrations().await;

    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database,
            pending_migrations,
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_time: Utc::now(),
        }),
    )
}
