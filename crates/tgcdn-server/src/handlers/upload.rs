use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tgcdn_core::FileUuid;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::error::ApiError;
use crate::mime;
use crate::state::AppState;

/// The first 1024 bytes are enough to run every magic-number check in
/// `mime::sniff`.
const SNIFF_WINDOW: usize = 1024;
const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Declared-type and streamed-size gate, factored out of the handler so it
/// can be exercised without a multipart body or a store.
fn check_declared_type(content_type: Option<&str>) -> Result<(), ApiError> {
    if content_type.map(mime::is_allowed_content_type).unwrap_or(false) {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

fn check_running_total(total: u64) -> Result<(), ApiError> {
    if total > MAX_UPLOAD_BYTES {
        Err(ApiError::PayloadTooLarge)
    } else {
        Ok(())
    }
}

/// The declared `Content-Type` only gates entry to the stream; the bytes
/// have to back it up once they're all in hand, or a client can label a
/// PNG as a JPEG and sail through on the declared-type check alone.
fn check_sniff_matches_declared(sniff_buf: &[u8], declared: &str) -> Result<(), ApiError> {
    if mime::sniff_matches_declared(sniff_buf, declared) {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    result: &'static str,
    file_uuid: String,
}

pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    if field.name() != Some("file") {
        return Err(ApiError::BadRequest("expected multipart field \"file\"".to_string()));
    }

    let declared_content_type = field.content_type().map(|s| s.to_string());
    check_declared_type(declared_content_type.as_deref())?;

    let file_uuid = FileUuid::new();
    let staged_path = std::path::Path::new(&state.config.temp_dir).join(file_uuid.to_string());
    tokio::fs::create_dir_all(&state.config.temp_dir).await?;

    let mut file = tokio::fs::File::create(&staged_path).await?;
    let mut total: u64 = 0;
    let mut sniff_buf: Vec<u8> = Vec::with_capacity(SNIFF_WINDOW);
    let mut field = field;

    while let Some(chunk) = field.chunk().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        total += chunk.len() as u64;
        if let Err(e) = check_running_total(total) {
            drop(file);
            let _ = tokio::fs::remove_file(&staged_path).await;
            return Err(e);
        }
        if sniff_buf.len() < SNIFF_WINDOW {
            let remaining = SNIFF_WINDOW - sniff_buf.len();
            sniff_buf.extend(chunk.iter().take(remaining));
        }
        file.write_all(&chunk).await?;
    }

    let declared = declared_content_type.as_deref().unwrap_or_default();
    if let Err(e) = check_sniff_matches_declared(&sniff_buf, declared) {
        drop(file);
        let _ = tokio::fs::remove_file(&staged_path).await;
        return Err(e);
    }

    // fsync before the DB insert so the staged bytes are durable before a
    // worker can ever observe the queue row.
    file.sync_all().await?;
    drop(file);

    let now = Utc::now().naive_utc();
    if let Err(e) = state.store.queues.insert_ready(file_uuid, now).await {
        error!(%file_uuid, error = %e, "failed to insert queue row");
        let _ = tokio::fs::remove_file(&staged_path).await;
        return Err(e.into());
    }

    info!(%file_uuid, bytes = total, "upload staged");
    Ok(Json(UploadResponse {
        result: "1",
        file_uuid: file_uuid.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_content_type() {
        assert!(matches!(check_declared_type(None), Err(ApiError::UnsupportedMediaType)));
    }

    #[test]
    fn rejects_disallowed_content_type() {
        assert!(matches!(
            check_declared_type(Some("text/html")),
            Err(ApiError::UnsupportedMediaType)
        ));
    }

    #[test]
    fn accepts_whitelisted_content_type() {
        assert!(check_declared_type(Some("image/png")).is_ok());
    }

    #[test]
    fn enforces_size_cap_boundary() {
        assert!(check_running_total(MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            check_running_total(MAX_UPLOAD_BYTES + 1),
            Err(ApiError::PayloadTooLarge)
        ));
    }

    #[test]
    fn rejects_sniff_declared_mismatch() {
        let png_bytes = b"\x89PNG\r\n\x1a\nrest";
        assert!(check_sniff_matches_declared(png_bytes, "image/png").is_ok());
        assert!(matches!(
            check_sniff_matches_declared(png_bytes, "image/jpeg"),
            Err(ApiError::UnsupportedMediaType)
        ));
    }
}
