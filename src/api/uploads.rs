// Multipart media upload: the file lands in the configured upload directory
// under a uuid name and is served back at /uploads/<name>.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};

// DefaultBodyLimit trips inside the multipart reader, so an oversized body
// surfaces here rather than in the explicit size check below.
fn classify_multipart_error(status: StatusCode, detail: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the request size limit".to_string())
    } else {
        AppError::BadRequest(format!("Malformed multipart body: {}", detail))
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    classify_multipart_error(e.status(), e.to_string())
}

/// Validate and persist one uploaded file, returning the public URL path.
pub async fn store_upload(
    dir: &std::path::Path,
    max_bytes: usize,
    filename: Option<&str>,
    data: Option<&[u8]>,
) -> AppResult<String> {
    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if data.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            max_bytes
        )));
    }

    let extension = filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            AppError::Validation("File must have a simple extension (e.g. .jpg)".to_string())
        })?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase());

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("Upload directory unavailable: {}", e)))?;
    tokio::fs::write(dir.join(&stored_name), data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    tracing::info!(name = %stored_name, bytes = data.len(), "stored upload");

    Ok(format!("/uploads/{}", stored_name))
}

pub async fn upload_handler(
    State(state): State<AppState>,
    _viewer: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut filename = None;
    let mut data = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(multipart_error)?);
        }
    }

    let url = store_upload(
        std::path::Path::new(&state.config.uploads.dir),
        state.config.uploads.max_bytes,
        filename.as_deref(),
        data.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let url = store_upload(dir.path(), 1024, Some("plant.JPG"), Some(b"fake-image"))
            .await
            .unwrap();

        let name = url.strip_prefix("/uploads/").unwrap();
        assert!(name.ends_with(".jpg"));

        let on_disk = tokio::fs::read(dir.path().join(name)).await.unwrap();
        assert_eq!(on_disk, b"fake-image");
    }

    #[tokio::test]
    async fn test_upload_over_cap_is_too_large() {
        let dir = tempfile::tempdir().unwrap();

        let big = vec![0u8; 17];
        let err = store_upload(dir.path(), 16, Some("big.png"), Some(&big))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file_field_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let err = store_upload(dir.path(), 1024, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = store_upload(dir.path(), 1024, Some("x.png"), Some(b""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_requires_simple_extension() {
        let dir = tempfile::tempdir().unwrap();

        for name in [Some("noextension"), Some("weird.p?g"), None] {
            let err = store_upload(dir.path(), 1024, name, Some(b"data"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_oversized_body_maps_to_payload_too_large() {
        let err = classify_multipart_error(StatusCode::PAYLOAD_TOO_LARGE, "length limit".into());
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let err = classify_multipart_error(StatusCode::BAD_REQUEST, "bad boundary".into());
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
