//! Database pool initialization and schema creation
//!
//! The pool is opened once at process start and passed down explicitly;
//! nothing in the workspace holds global connection state.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Initialize the database connection pool and create the schema.
///
/// Accepts any SQLite connection string (`sqlite://path`, `sqlite::memory:`).
/// The database file is created if missing. WAL mode and a busy timeout keep
/// concurrent submissions serialized on the write lock instead of failing
/// fast.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create the rifa tables and indexes if they don't exist.
///
/// Idempotent; safe to run on every startup.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            national_id TEXT,
            phone TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participants(id),
            bank_from TEXT,
            payment_phone TEXT,
            amount_paid REAL NOT NULL,
            reference_suffix TEXT NOT NULL,
            screenshot_reference TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            validation_result TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The true guard behind the duplicate-payment check: the application's
    // SELECT is only a fast path, this index decides races.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_validated_reference
            ON payments(reference_suffix) WHERE status = 'validated'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_number INTEGER NOT NULL UNIQUE,
            participant_id INTEGER NOT NULL REFERENCES participants(id),
            status TEXT NOT NULL DEFAULT 'reserved',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raffle_config (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            ticket_price REAL NOT NULL,
            total_tickets INTEGER NOT NULL,
            draw_date TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database schema initialized (participants, payments, tickets, raffle_config)"
    );

    Ok(())
}
