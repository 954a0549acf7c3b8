//! Login, logout and session handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use orderdesk_core::validation::validate_name;
use orderdesk_core::{LoginRequest, LoginResponse, SessionInfo};

use crate::auth::Session;
use crate::error::ApiError;
use crate::AppState;

/// `POST /api/auth/login`
///
/// A vendor logs in with its id and name. Any mismatch is reported the same
/// way so ids cannot be probed.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body?;

    if req.vendor_id.trim().is_empty() {
        return Err(ApiError::Validation("vendor_id is required".to_string()));
    }
    validate_name("name", &req.name)?;

    let vendor = state
        .db
        .vendors()
        .authenticate(&req.vendor_id, &req.name)
        .await?
        .ok_or_else(|| {
            warn!(vendor_id = %req.vendor_id.trim(), "Login rejected");
            ApiError::unauthorized("Invalid vendor credentials")
        })?;

    let settings = state.db.settings().get().await?;

    let purged = state.sessions.purge_expired().await;
    if purged > 0 {
        debug!(purged, "Expired sessions dropped");
    }

    let session_id = Uuid::new_v4().to_string();
    let issued = state.jwt.generate_session_token(&vendor.id, &session_id)?;

    state
        .sessions
        .insert(Session {
            id: session_id.clone(),
            vendor: vendor.clone(),
            expires_at: issued.expires_at,
        })
        .await;

    info!(vendor_id = %vendor.id, session_id = %session_id, "Vendor logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        session: SessionInfo {
            session_id,
            vendor,
            settings,
            expires_at: issued.expires_at,
        },
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> StatusCode {
    if state.sessions.remove(&session.id).await {
        info!(vendor_id = %session.vendor.id, session_id = %session.id, "Vendor logged out");
    }
    StatusCode::NO_CONTENT
}

/// `GET /api/auth/session`
///
/// Returns the caller's session with the current settings, so a client can
/// pick up a tax change without logging in again.
pub async fn session(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SessionInfo>, ApiError> {
    let settings = state.db.settings().get().await?;

    Ok(Json(SessionInfo {
        session_id: session.id,
        vendor: session.vendor,
        settings,
        expires_at: session.expires_at,
    }))
}
