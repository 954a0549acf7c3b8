//! Session authentication module.
//!
//! A login creates a server-side [`Session`] and a JWT naming it. Every
//! protected request must carry the token, and the session it names must
//! still be in the [`SessionRegistry`], so logout takes effect immediately
//! even though the token itself has not expired.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization: Bearer <jwt>                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  require_session ── signature / exp ok? ── no ──► 401 UNAUTHORIZED      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SessionRegistry.get(claims.sid) ──── missing / expired ──► 401         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  request.extensions += Session  ──►  handler(Extension<Session>)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use orderdesk_core::Vendor;

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (vendor id)
    pub sub: String,

    /// Server-side session id
    pub sid: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// A token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generates a token for a vendor's session.
    pub fn generate_session_token(
        &self,
        vendor_id: &str,
        session_id: &str,
    ) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: vendor_id.to_string(),
            sid: session_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates signature and expiry and returns the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Sessions
// =============================================================================

/// The context a logged-in vendor works in. Handlers receive it as an
/// `Extension<Session>`.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub vendor: Vendor,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        debug!(session_id = %session.id, vendor_id = %session.vendor.id, "Session opened");
        self.sessions.write().await.insert(session.id.clone(), session);
    }

    /// Returns a live session. An expired one is dropped on the way.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let session = self.sessions.read().await.get(id).cloned()?;
        if session.is_expired() {
            self.sessions.write().await.remove(id);
            return None;
        }
        Some(session)
    }

    /// Removes a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drops every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Middleware guarding every route except health and login.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = state.jwt.validate_token(token)?;

    let session = match state.sessions.get(&claims.sid).await {
        Some(session) if session.vendor.id == claims.sub => session,
        _ => {
            warn!(vendor_id = %claims.sub, "Token for unknown or closed session");
            return Err(ApiError::unauthorized("Session has ended, log in again"));
        }
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
