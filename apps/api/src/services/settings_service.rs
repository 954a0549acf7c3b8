//! Company settings.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use tracing::info;

use orderdesk_core::Settings;

use crate::auth::Session;
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/settings`
pub async fn get(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.db.settings().get().await?))
}

/// `PUT /api/settings`
///
/// Only affects documents issued afterwards; stored transactions keep the
/// tax configuration they were issued with.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    body: Result<Json<Settings>, JsonRejection>,
) -> Result<Json<Settings>, ApiError> {
    let Json(settings) = body?;
    let saved = state.db.settings().update(&settings).await?;

    info!(
        vendor_id = %session.vendor.id,
        tax_mode = saved.tax_mode.as_str(),
        tax_rate_bps = saved.tax_rate_bps,
        "Settings updated"
    );
    Ok(Json(saved))
}
