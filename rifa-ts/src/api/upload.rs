//! Payment screenshot upload

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::services::storage::StoredObject;
use crate::{ApiError, ApiResult, AppState};

/// POST /upload response
///
/// `url` when a storage backend took the file, `inlineData` when the
/// service is running without one.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<String>,
}

/// POST /upload
///
/// Accepts a multipart `file` field and hands it to the storage backend.
pub async fn upload_screenshot(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("screenshot").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
            file = Some((file_name, content_type, bytes.to_vec()));
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(ApiError::BadRequest("no file uploaded".to_string()));
    };

    match state.storage.store(&file_name, &content_type, bytes).await {
        Ok(StoredObject::Remote { url }) => Ok(Json(UploadResponse {
            success: true,
            url: Some(url),
            inline_data: None,
        })),
        Ok(StoredObject::Inline { data_url }) => Ok(Json(UploadResponse {
            success: true,
            url: None,
            inline_data: Some(data_url),
        })),
        Err(e) => {
            tracing::error!("Screenshot upload failed: {}", e);
            Err(ApiError::Internal("failed to store screenshot".to_string()))
        }
    }
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_screenshot))
}
