//! Ticket count and purchase-intent endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::tickets;
use crate::{ApiError, ApiResult, AppState};

/// GET /tickets/count response
#[derive(Debug, Serialize)]
pub struct TicketCountResponse {
    pub count: i64,
}

/// GET /tickets/count
pub async fn ticket_count(State(state): State<AppState>) -> ApiResult<Json<TicketCountResponse>> {
    let count = tickets::count_sold(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to count tickets: {}", e)))?;

    Ok(Json(TicketCountResponse { count }))
}

/// POST /tickets/purchase request
///
/// Notify-only flow for a manually assigned ticket: records nothing and
/// allocates nothing, it just tells the operator channel.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(default, alias = "cedula", alias = "nationalId")]
    pub national_id: Option<String>,
    pub email: Option<String>,
    #[serde(default, alias = "ticketNum")]
    pub ticket_num: Option<i64>,
    pub reference: Option<String>,
    #[serde(default, alias = "amountPaid")]
    pub amount: Option<f64>,
}

/// POST /tickets/purchase response
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    #[serde(rename = "ticketNum")]
    pub ticket_num: i64,
}

/// POST /tickets/purchase
pub async fn purchase_ticket(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<Json<PurchaseResponse>> {
    let (Some(name), Some(phone), Some(ticket_num), Some(reference), Some(amount)) = (
        request.name.as_deref(),
        request.phone.as_deref(),
        request.ticket_num,
        request.reference.as_deref(),
        request.amount,
    ) else {
        return Err(ApiError::BadRequest(
            "name, phone, ticketNum, reference and amount are required".to_string(),
        ));
    };

    state.notifier.dispatch(format_purchase_message(
        name,
        phone,
        request.national_id.as_deref(),
        request.email.as_deref(),
        ticket_num,
        reference,
        amount,
    ));

    Ok(Json(PurchaseResponse {
        success: true,
        ticket_num,
    }))
}

fn format_purchase_message(
    name: &str,
    phone: &str,
    national_id: Option<&str>,
    email: Option<&str>,
    ticket_num: i64,
    reference: &str,
    amount: f64,
) -> String {
    format!(
        "🎫 *New entry*\n\n\
         👤 *Name:* {}\n\
         📱 *Phone:* {}\n\
         🪪 *ID:* {}\n\
         📧 *Email:* {}\n\
         🎫 *Ticket:* {}\n\
         💳 *Reference:* {}\n\
         💵 *Amount:* Bs. {:.2}",
        name,
        phone,
        national_id.unwrap_or("N/A"),
        email.unwrap_or("N/A"),
        ticket_num,
        reference,
        amount,
    )
}

/// Build ticket routes
pub fn tickets_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets/count", get(ticket_count))
        .route("/tickets/purchase", post(purchase_ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_request_accepts_camel_case_aliases() {
        let request: PurchaseRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "phone": "0414",
            "cedula": "V-123",
            "ticketNum": 42,
            "reference": "7788",
            "amount": 250.0,
        }))
        .unwrap();

        assert_eq!(request.national_id.as_deref(), Some("V-123"));
        assert_eq!(request.ticket_num, Some(42));
    }

    #[test]
    fn test_purchase_message_mentions_ticket_and_reference() {
        let message = format_purchase_message("Ana", "0414", None, None, 42, "7788", 250.0);
        assert!(message.contains("42"));
        assert!(message.contains("7788"));
        assert!(message.contains("N/A"));
    }
}
