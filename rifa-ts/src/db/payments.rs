//! Payment database operations

use chrono::Utc;
use rifa_common::db::models::{Payment, PaymentStatus, Verdict};
use rifa_common::{Error, Result};
use sqlx::{Sqlite, SqlitePool};

/// Fast-path duplicate lookup: id of a validated payment with this
/// reference, if any.
///
/// Races between concurrent submissions are decided by the partial unique
/// index on validated references, not by this query.
pub async fn find_validated_by_reference(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM payments WHERE reference_suffix = ? AND status = 'validated'",
    )
    .bind(reference)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// One proof submission, written exactly once with its final status.
#[derive(Debug)]
pub struct NewPayment<'a> {
    pub participant_id: i64,
    pub bank_from: Option<&'a str>,
    pub payment_phone: Option<&'a str>,
    pub amount_paid: f64,
    pub reference_suffix: &'a str,
    pub screenshot_reference: Option<&'a str>,
    pub status: PaymentStatus,
    pub verdict: &'a Verdict,
}

/// Insert a payment row and return its id.
///
/// Takes any executor so the accept path can run it inside the allocation
/// transaction while the reject path writes straight to the pool.
pub async fn insert_payment<'e, E>(db: E, payment: &NewPayment<'_>) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let verdict_json = serde_json::to_string(payment.verdict)
        .map_err(|e| Error::Internal(format!("Failed to serialize verdict: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO payments (
            participant_id, bank_from, payment_phone, amount_paid,
            reference_suffix, screenshot_reference, status, validation_result,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payment.participant_id)
    .bind(payment.bank_from)
    .bind(payment.payment_phone)
    .bind(payment.amount_paid)
    .bind(payment.reference_suffix)
    .bind(payment.screenshot_reference)
    .bind(payment.status)
    .bind(verdict_json)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load a payment by id.
pub async fn get_payment(pool: &SqlitePool, id: i64) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, participant_id, bank_from, payment_phone, amount_paid,
               reference_suffix, screenshot_reference, status,
               validation_result, created_at
        FROM payments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}
