//! Operator notifications
//!
//! Best-effort messages to a Telegram channel. Failures are logged and never
//! reach the caller: the success response is decided before any notification
//! is attempted.

use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Notifier client errors
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),
}

/// Telegram destination for operator notifications.
#[derive(Debug, Clone)]
pub struct TelegramTarget {
    pub bot_token: String,
    pub chat_id: String,
}

/// Operator notification client
#[derive(Clone)]
pub struct Notifier {
    http_client: reqwest::Client,
    target: Option<TelegramTarget>,
}

impl Notifier {
    pub fn new(target: Option<TelegramTarget>) -> Result<Self, NotifierError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            target,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Dispatch a notification without waiting for it.
    ///
    /// Runs after the caller's response is already determined; the spawned
    /// task owns the failure and only logs it.
    pub fn dispatch(&self, text: String) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&text).await {
                warn!("Operator notification failed: {}", e);
            }
        });
    }

    async fn send(&self, text: &str) -> Result<(), NotifierError> {
        let Some(target) = &self.target else {
            debug!("Notifier not configured; skipping operator notification");
            return Ok(());
        };

        let url = format!(
            "{}/bot{}/sendMessage",
            TELEGRAM_API_BASE_URL, target.bot_token
        );
        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "chat_id": target.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api(status.as_u16(), error_text));
        }

        debug!("Operator notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_notifier_send_is_a_no_op() {
        let notifier = Notifier::new(None).unwrap();
        assert!(!notifier.is_configured());
        assert!(notifier.send("hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_returns_immediately() {
        let notifier = Notifier::new(None).unwrap();
        // Fire-and-forget must not block or panic the caller.
        notifier.dispatch("hello".to_string());
    }
}
