//! rifa-ts library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::notifier::Notifier;
use crate::services::storage::ObjectStorage;
use crate::services::validator::ProofValidator;

/// Largest accepted payment screenshot upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, opened once at startup
    pub db: SqlitePool,
    /// Payment proof validator client
    pub validator: Arc<ProofValidator>,
    /// Operator notification client
    pub notifier: Arc<Notifier>,
    /// Screenshot storage client
    pub storage: Arc<ObjectStorage>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        validator: Arc<ProofValidator>,
        notifier: Arc<Notifier>,
        storage: Arc<ObjectStorage>,
    ) -> Self {
        Self {
            db,
            validator,
            notifier,
            storage,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// CORS stays permissive: the frontend is served from a different origin and
/// the original deployment allowed any caller.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::root_routes())
        .merge(api::health_routes())
        .merge(api::tickets_routes())
        .merge(api::upload_routes())
        .merge(api::payments_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
