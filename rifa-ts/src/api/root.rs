//! Service info page and raffle configuration

use axum::{extract::State, response::Html, routing::get, Json, Router};
use rifa_common::db::models::RaffleConfig;

use crate::db::raffle;
use crate::{ApiError, ApiResult, AppState};

/// GET /
///
/// Plain info page confirming the service is up.
pub async fn service_info(State(state): State<AppState>) -> Html<String> {
    let raffle_line = match raffle::get_config(&state.db).await {
        Ok(Some(config)) => format!(
            "<p>Raffle: {} &mdash; Bs. {:.2} per ticket, {} tickets total.</p>",
            config.name, config.ticket_price, config.total_tickets
        ),
        Ok(None) => "<p>No raffle configured yet.</p>".to_string(),
        Err(e) => {
            tracing::warn!("Failed to load raffle config: {}", e);
            String::new()
        }
    };

    Html(format!(
        "<h1>Rifa ticket service running</h1>{}<p>Version {}</p>",
        raffle_line,
        env!("CARGO_PKG_VERSION")
    ))
}

/// GET /raffle
///
/// Static raffle reference data, if seeded.
pub async fn raffle_config(State(state): State<AppState>) -> ApiResult<Json<RaffleConfig>> {
    let config = raffle::get_config(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("no raffle configured".to_string()))?;

    Ok(Json(config))
}

/// Build root routes
pub fn root_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/raffle", get(raffle_config))
}
