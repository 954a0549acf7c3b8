//! # OrderDesk API
//!
//! REST backend for route sales: catalog, clients, vendors, invoices,
//! payments and their PDFs.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Services                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth          │  │  catalog       │  │  transactions              ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • products     │  │ • list / get               ││
//! │  │ • logout       │  │ • clients      │  │ • create invoice           ││
//! │  │ • session      │  │ • vendors      │  │ • record payment           ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │  settings      │  │  calc          │  │  documents     │            │
//! │  │ • get / update │  │ • totals       │  │ • PDF          │            │
//! │  │                │  │ • payment      │  │                │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────┐│  │
//! │  │  │  SQLite      │  │ SessionRegistry  │  │  genpdf + TTF fonts  ││  │
//! │  │  │ orderdesk-db │  │ JWT + RwLock map │  │                      ││  │
//! │  │  └──────────────┘  └──────────────────┘  └──────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `ORDERDESK_CONFIG` - TOML config file
//! - `ORDERDESK_PORT` - HTTP port (default: 8080)
//! - `ORDERDESK_DATABASE_PATH` - SQLite file
//! - `ORDERDESK_JWT_SECRET` - Secret for session tokens
//! - `ORDERDESK_SESSION_LIFETIME_SECS` - Session lifetime (default: 43200)
//! - `ORDERDESK_FONTS_DIR` - Fonts for PDFs

pub mod auth;
pub mod config;
pub mod error;
pub mod pdf;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use orderdesk_db::Database;

use crate::auth::{require_session, JwtManager, SessionRegistry};
use crate::pdf::PdfRenderer;
use crate::services::{
    auth_service, calc_service, catalog_service, document_service, health_service,
    settings_service, transaction_service,
};

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub sessions: SessionRegistry,
    pub pdf: PdfRenderer,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.session_lifetime_secs);
        let pdf = PdfRenderer::new(config.fonts_dir.clone(), config.font_family.clone());

        AppState {
            db,
            config,
            jwt,
            sessions: SessionRegistry::new(),
            pdf,
        }
    }
}

/// Builds the full router. Everything except health and login sits behind
/// [`require_session`].
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/auth/logout", post(auth_service::logout))
        .route("/api/auth/session", get(auth_service::session))
        .route(
            "/api/products",
            get(catalog_service::list_products).post(catalog_service::create_product),
        )
        .route(
            "/api/products/{id}",
            get(catalog_service::get_product)
                .put(catalog_service::update_product)
                .delete(catalog_service::delete_product),
        )
        .route(
            "/api/clients",
            get(catalog_service::list_clients).post(catalog_service::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(catalog_service::get_client)
                .put(catalog_service::update_client)
                .delete(catalog_service::delete_client),
        )
        .route(
            "/api/vendors",
            get(catalog_service::list_vendors).post(catalog_service::create_vendor),
        )
        .route(
            "/api/vendors/{id}",
            get(catalog_service::get_vendor)
                .put(catalog_service::update_vendor)
                .delete(catalog_service::delete_vendor),
        )
        .route("/api/transactions", get(transaction_service::list))
        .route(
            "/api/transactions/invoices",
            post(transaction_service::create_invoice),
        )
        .route("/api/transactions/{id}", get(transaction_service::get))
        .route(
            "/api/transactions/{id}/payments",
            post(transaction_service::record_payment),
        )
        .route("/api/transactions/{id}/pdf", get(document_service::transaction_pdf))
        .route("/api/facturas/pdf/{id}", get(document_service::transaction_pdf))
        .route(
            "/api/settings",
            get(settings_service::get).put(settings_service::update),
        )
        .route("/api/calc/totals", post(calc_service::totals))
        .route("/api/calc/payment", post(calc_service::payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let mut app = Router::new()
        .route("/api/health", get(health_service::health))
        .route("/api/auth/login", post(auth_service::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http());

    if state.config.cors_allow_any {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.with_state(state)
}

/// Serves the API on an already-bound listener until `shutdown` resolves.
pub async fn run_with_listener(
    state: Arc<AppState>,
    listener: tokio::net::TcpListener,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
