//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Lifecycle of a payment record.
///
/// Set once when the row is inserted and never revised afterwards:
/// `pending -> validated` (tickets follow) or `pending -> rejected`
/// (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Validated,
    Rejected,
}

/// Lifecycle of an allocated ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketStatus {
    Reserved,
    Paid,
}

/// Structured output of the payment proof validator.
///
/// Always produced, whatever the validator backend does: provider errors and
/// timeouts become `{valid: false, confidence: 0.0}` verdicts with the error
/// in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    pub confidence: f64,
    pub details: String,
}

/// One person who submitted a payment proof.
///
/// Inserted for every submission attempt, including ones the validator later
/// rejects — a participant row is an audit record, not an approval.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub national_id: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One payment proof submission.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub participant_id: i64,
    pub bank_from: Option<String>,
    pub payment_phone: Option<String>,
    pub amount_paid: f64,
    pub reference_suffix: String,
    pub screenshot_reference: Option<String>,
    pub status: PaymentStatus,
    pub validation_result: Option<Json<Verdict>>,
    pub created_at: DateTime<Utc>,
}

/// One allocated raffle ticket. Numbers are globally unique, contiguous from
/// 1, and permanent once assigned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub ticket_number: i64,
    pub participant_id: i64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// Static raffle reference data (name, price, size, draw date).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RaffleConfig {
    pub id: i64,
    pub name: String,
    pub ticket_price: f64,
    pub total_tickets: i64,
    pub draw_date: Option<DateTime<Utc>>,
}
