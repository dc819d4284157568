//! Ticket database operations

use chrono::Utc;
use rifa_common::db::models::{Ticket, TicketStatus};
use rifa_common::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Count tickets sold (status = paid).
pub async fn count_sold(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE status = 'paid'")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Allocate a contiguous block of `quantity` ticket numbers inside `tx`.
///
/// Each insert computes `MAX(ticket_number) + 1` in the same statement that
/// claims it, so there is no read-then-write window; the block stays
/// contiguous because the transaction holds the write lock from the first
/// insert until commit. A concurrent claim surfaces as a unique violation on
/// `ticket_number`, which the caller retries.
pub async fn allocate_batch(
    tx: &mut Transaction<'_, Sqlite>,
    participant_id: i64,
    quantity: u32,
) -> Result<Vec<i64>> {
    let mut numbers = Vec::with_capacity(quantity as usize);

    for _ in 0..quantity {
        let number = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tickets (ticket_number, participant_id, status, created_at)
            SELECT COALESCE(MAX(ticket_number), 0) + 1, ?, ?, ? FROM tickets
            RETURNING ticket_number
            "#,
        )
        .bind(participant_id)
        .bind(TicketStatus::Paid)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&mut **tx)
        .await?;

        numbers.push(number);
    }

    Ok(numbers)
}

/// Tickets belonging to one participant, in allocation order.
pub async fn list_for_participant(pool: &SqlitePool, participant_id: i64) -> Result<Vec<Ticket>> {
    let tickets = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, ticket_number, participant_id, status, created_at
        FROM tickets
        WHERE participant_id = ?
        ORDER BY ticket_number
        "#,
    )
    .bind(participant_id)
    .fetch_all(pool)
    .await?;

    Ok(tickets)
}
