//! Raffle configuration queries

use rifa_common::db::models::RaffleConfig;
use rifa_common::Result;
use sqlx::SqlitePool;

/// Load the active raffle configuration, if one has been seeded.
pub async fn get_config(pool: &SqlitePool) -> Result<Option<RaffleConfig>> {
    let config = sqlx::query_as::<_, RaffleConfig>(
        r#"
        SELECT id, name, ticket_price, total_tickets, draw_date
        FROM raffle_config
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(config)
}
