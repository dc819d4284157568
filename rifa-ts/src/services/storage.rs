//! Payment screenshot storage
//!
//! Uploads go to a Supabase Storage bucket when credentials are configured.
//! Without them the screenshot comes back inline as a data: URL, which the
//! client can feed straight into /validate-payment.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Storage client errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload rejected {0}: {1}")]
    Upload(u16, String),
}

/// Supabase Storage backend coordinates.
#[derive(Debug, Clone)]
pub struct StorageBackend {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

/// Where a stored screenshot ended up.
#[derive(Debug, Clone)]
pub enum StoredObject {
    /// Public object URL on the storage backend.
    Remote { url: String },
    /// Inline data: URL fallback when no backend is configured.
    Inline { data_url: String },
}

/// Screenshot storage client
#[derive(Clone)]
pub struct ObjectStorage {
    http_client: reqwest::Client,
    backend: Option<StorageBackend>,
}

impl ObjectStorage {
    pub fn new(backend: Option<StorageBackend>) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            backend,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Store a screenshot and return where it can be fetched from.
    pub async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let Some(backend) = &self.backend else {
            warn!("Object storage not configured; returning screenshot inline");
            let data_url = format!("data:{};base64,{}", content_type, BASE64.encode(&bytes));
            return Ok(StoredObject::Inline { data_url });
        };

        let object_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let base_url = backend.base_url.trim_end_matches('/');
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            base_url, backend.bucket, object_name
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&backend.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::Upload(status.as_u16(), error_text));
        }

        let public_url = format!(
            "{}/storage/v1/object/public/{}/{}",
            base_url, backend.bucket, object_name
        );
        info!("Screenshot stored: {}", public_url);

        Ok(StoredObject::Remote { url: public_url })
    }
}

/// Keep object names safe for URL paths; anything unusual becomes '-'.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "screenshot".to_string()
    } else {
        cleaned
    }
}
