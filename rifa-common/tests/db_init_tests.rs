//! Tests for database initialization and the store-level guards
//!
//! The workflow's correctness leans on two constraints the schema must
//! enforce regardless of what the application layer checks: the partial
//! unique index on validated payment references and the unique ticket
//! number column.

use rifa_common::db::init_pool;
use rifa_common::db::models::PaymentStatus;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db_path = dir.path().join("rifa-test.db");
    let url = format!("sqlite://{}", db_path.display());
    let pool = init_pool(&url).await.expect("failed to initialize pool");
    (pool, dir)
}

async fn insert_participant(pool: &SqlitePool) -> i64 {
    let result = sqlx::query(
        "INSERT INTO participants (name, phone, created_at) VALUES (?, ?, ?)",
    )
    .bind("Test Person")
    .bind("04141234567")
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .unwrap();
    result.last_insert_rowid()
}

async fn insert_payment(pool: &SqlitePool, participant_id: i64, reference: &str, status: PaymentStatus) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO payments (participant_id, amount_paid, reference_suffix, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(participant_id)
    .bind(100.0_f64)
    .bind(reference)
    .bind(status)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fresh.db");
    assert!(!db_path.exists());

    let url = format!("sqlite://{}", db_path.display());
    let pool = init_pool(&url).await;
    assert!(pool.is_ok(), "initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "database file was not created");
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let (pool, _dir) = test_pool().await;

    // Running schema creation again against the same database must succeed
    let result = rifa_common::db::init::create_schema(&pool).await;
    assert!(result.is_ok(), "second schema run failed: {:?}", result.err());
}

#[tokio::test]
async fn test_duplicate_validated_reference_rejected_by_store() {
    let (pool, _dir) = test_pool().await;
    let participant_id = insert_participant(&pool).await;

    insert_payment(&pool, participant_id, "4321", PaymentStatus::Validated)
        .await
        .expect("first validated payment should insert");

    let second = insert_payment(&pool, participant_id, "4321", PaymentStatus::Validated).await;
    let err = rifa_common::Error::Database(second.expect_err("duplicate validated reference must fail"));
    assert!(
        rifa_common::db::is_unique_violation(&err),
        "expected a unique violation, got: {err}"
    );
}

#[tokio::test]
async fn test_rejected_payments_may_share_a_reference() {
    let (pool, _dir) = test_pool().await;
    let participant_id = insert_participant(&pool).await;

    // The index only guards validated payments; repeated failed attempts
    // with the same reference are legitimate audit rows.
    insert_payment(&pool, participant_id, "9999", PaymentStatus::Rejected)
        .await
        .unwrap();
    insert_payment(&pool, participant_id, "9999", PaymentStatus::Rejected)
        .await
        .unwrap();
    insert_payment(&pool, participant_id, "9999", PaymentStatus::Validated)
        .await
        .expect("a validated payment may follow rejected ones with the same reference");
}

#[tokio::test]
async fn test_ticket_numbers_unique_across_table() {
    let (pool, _dir) = test_pool().await;
    let participant_id = insert_participant(&pool).await;

    sqlx::query(
        "INSERT INTO tickets (ticket_number, participant_id, status, created_at) VALUES (?, ?, 'paid', ?)",
    )
    .bind(1_i64)
    .bind(participant_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&pool)
    .await
    .unwrap();

    let duplicate = sqlx::query(
        "INSERT INTO tickets (ticket_number, participant_id, status, created_at) VALUES (?, ?, 'paid', ?)",
    )
    .bind(1_i64)
    .bind(participant_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&pool)
    .await;

    let err = rifa_common::Error::Database(duplicate.expect_err("duplicate ticket number must fail"));
    assert!(rifa_common::db::is_unique_violation(&err));
}
