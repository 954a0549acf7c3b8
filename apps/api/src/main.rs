//! # OrderDesk API
//!
//! REST server for the route-sales front ends.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          OrderDesk API Server                           │
//! │                                                                         │
//! │  Mobile / Web ───► HTTP (8080) ───► Handlers ───► SQLite               │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                 SessionRegistry                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use orderdesk_api::{run_with_listener, ApiConfig, AppState};
use orderdesk_db::{Database, DbConfig};

/// OrderDesk REST API server
#[derive(Debug, Parser)]
#[command(name = "orderdesk-api", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ORDERDESK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    info!("Starting OrderDesk API server...");

    let config = ApiConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    info!(
        bind = %config.bind_addr(),
        database = %config.database_path.display(),
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set ORDERDESK_JWT_SECRET in production");
    }

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;

    let state = Arc::new(AppState::new(db, config));

    run_with_listener(state.clone(), listener, shutdown_signal()).await?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
