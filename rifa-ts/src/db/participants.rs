//! Participant database operations

use chrono::Utc;
use rifa_common::db::models::Participant;
use rifa_common::Result;
use sqlx::SqlitePool;

/// Insert a participant row and return its id.
///
/// Called for every submission attempt before validation runs; the row is an
/// audit record and never implies an approved payment.
pub async fn insert_participant(
    pool: &SqlitePool,
    name: &str,
    national_id: Option<&str>,
    phone: &str,
    email: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO participants (name, national_id, phone, email, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(national_id)
    .bind(phone)
    .bind(email)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load a participant by id.
pub async fn get_participant(pool: &SqlitePool, id: i64) -> Result<Option<Participant>> {
    let participant = sqlx::query_as::<_, Participant>(
        "SELECT id, name, national_id, phone, email, created_at FROM participants WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(participant)
}
