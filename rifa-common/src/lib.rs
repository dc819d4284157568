//! # Rifa Common Library
//!
//! Shared code for the rifa raffle backend:
//! - Common error type
//! - Database pool initialization and schema
//! - Data models (participants, payments, tickets, raffle configuration)

pub mod db;
pub mod error;

pub use error::{Error, Result};
