//! rifa-ts - Raffle Ticket Sales Service
//!
//! Accepts payment proofs for raffle tickets, validates them against the
//! uploaded screenshot, allocates sequential ticket numbers, and notifies
//! the operator channel.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rifa_ts::config::{self, Args};
use rifa_ts::services::notifier::Notifier;
use rifa_ts::services::storage::ObjectStorage;
use rifa_ts::services::validator::ProofValidator;
use rifa_ts::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rifa_ts=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting rifa ticket sales service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db = rifa_common::db::init_pool(&args.database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    config::log_integration_summary(&args);

    let validator = Arc::new(
        ProofValidator::new(
            args.validator_api_key.clone(),
            args.validator_model.clone(),
            args.validator_timeout(),
        )
        .context("Failed to create proof validator")?,
    );
    let notifier =
        Arc::new(Notifier::new(args.telegram_target()).context("Failed to create notifier")?);
    let storage = Arc::new(
        ObjectStorage::new(args.storage_backend()).context("Failed to create object storage")?,
    );

    let state = AppState::new(db.clone(), validator, notifier, storage);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The pool's lifecycle matches the process: opened above, closed here.
    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
