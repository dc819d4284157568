//! Database access shared across the rifa crates
//!
//! Pool lifecycle and schema live here; the service crate layers its
//! per-entity queries on top.

pub mod init;
pub mod models;

pub use init::init_pool;

use crate::Error;
use sqlx::error::ErrorKind;

/// Classify a store error as a uniqueness-constraint violation.
///
/// The ticket allocation workflow relies on two store-level guards: the
/// partial unique index on validated payment references and the unique
/// `ticket_number` column. Both surface as unique violations, which callers
/// must distinguish from other database failures (duplicate submission vs.
/// genuine internal error).
pub fn is_unique_violation(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db_err)) => {
            matches!(db_err.kind(), ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}
