//! Service configuration
//!
//! Every option resolves CLI flag first, then environment variable, then the
//! compiled default. Only the database connection is mandatory; each missing
//! external integration degrades the service instead of stopping it.

use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::notifier::TelegramTarget;
use crate::services::storage::StorageBackend;

/// Command-line arguments for rifa-ts
#[derive(Parser, Debug, Clone)]
#[command(name = "rifa-ts")]
#[command(about = "Raffle ticket sales service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Telegram bot token for operator notifications
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat id of the operator channel
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// API key for the payment proof validator
    #[arg(long, env = "VALIDATOR_API_KEY")]
    pub validator_api_key: Option<String>,

    /// Vision model used for proof validation
    #[arg(long, default_value = "gemini-1.5-flash", env = "VALIDATOR_MODEL")]
    pub validator_model: String,

    /// Upper bound on a single proof validation call, in seconds
    #[arg(long, default_value = "20", env = "VALIDATOR_TIMEOUT_SECS")]
    pub validator_timeout_secs: u64,

    /// Object storage base URL (Supabase project URL)
    #[arg(long, env = "STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Object storage service key
    #[arg(long, env = "STORAGE_KEY")]
    pub storage_key: Option<String>,

    /// Object storage bucket for payment screenshots
    #[arg(long, default_value = "proofs", env = "STORAGE_BUCKET")]
    pub storage_bucket: String,
}

impl Args {
    /// Telegram destination, if both token and chat id are present.
    pub fn telegram_target(&self) -> Option<TelegramTarget> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramTarget {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => None,
        }
    }

    /// Object storage backend, if both URL and key are present.
    pub fn storage_backend(&self) -> Option<StorageBackend> {
        match (&self.storage_url, &self.storage_key) {
            (Some(base_url), Some(service_key)) => Some(StorageBackend {
                base_url: base_url.clone(),
                service_key: service_key.clone(),
                bucket: self.storage_bucket.clone(),
            }),
            _ => None,
        }
    }

    pub fn validator_timeout(&self) -> Duration {
        Duration::from_secs(self.validator_timeout_secs)
    }
}

/// Announce which external integrations are live and which are degraded.
pub fn log_integration_summary(args: &Args) {
    if args.telegram_target().is_some() {
        info!("Operator notifications: Telegram");
    } else {
        warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set; operator notifications disabled");
    }

    if args.validator_api_key.is_some() {
        info!("Payment proof validation: model {}", args.validator_model);
    } else {
        warn!("VALIDATOR_API_KEY not set; payment proofs will be approved without inspection");
    }

    if args.storage_backend().is_some() {
        info!("Screenshot storage: bucket {}", args.storage_bucket);
    } else {
        warn!("STORAGE_URL/STORAGE_KEY not set; screenshots will be returned inline");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["rifa-ts", "--database-url", "sqlite::memory:"])
    }

    #[test]
    fn test_defaults() {
        let args = base_args();
        assert_eq!(args.port, 3000);
        assert_eq!(args.validator_model, "gemini-1.5-flash");
        assert_eq!(args.validator_timeout(), Duration::from_secs(20));
        assert_eq!(args.storage_bucket, "proofs");
    }

    #[test]
    fn test_telegram_target_requires_both_values() {
        let mut args = base_args();
        args.telegram_bot_token = Some("token".to_string());
        assert!(args.telegram_target().is_none());

        args.telegram_chat_id = Some("-100123".to_string());
        assert!(args.telegram_target().is_some());
    }

    #[test]
    fn test_storage_backend_requires_both_values() {
        let mut args = base_args();
        args.storage_url = Some("https://project.supabase.co".to_string());
        assert!(args.storage_backend().is_none());

        args.storage_key = Some("service-key".to_string());
        let backend = args.storage_backend().unwrap();
        assert_eq!(backend.bucket, "proofs");
    }
}
