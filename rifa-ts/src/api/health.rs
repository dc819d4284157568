//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    /// Module name ("rifa-ts")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Database reachability
    pub database: String,
    /// Proof validator integration state
    pub validator: String,
    /// Operator notifier integration state
    pub notifier: String,
    /// Screenshot storage integration state
    pub storage: String,
}

/// GET /health
///
/// Degraded integrations are visible here: each optional external service
/// reports whether it is live or running in its fallback mode.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "ok",
        Err(_) => "unreachable",
    };

    Json(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" }.to_string(),
        module: "rifa-ts".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        database: database.to_string(),
        validator: if state.validator.is_configured() {
            "ok".to_string()
        } else {
            "disabled (auto-approve)".to_string()
        },
        notifier: if state.notifier.is_configured() {
            "ok".to_string()
        } else {
            "disabled".to_string()
        },
        storage: if state.storage.is_configured() {
            "ok".to_string()
        } else {
            "disabled (inline fallback)".to_string()
        },
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
