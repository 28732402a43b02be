//! Upload handlers

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use axum::extract::State;
use axum::Json;
use tracing::info;

use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::UploadStatusResponse;
use crate::errors::ExplorerError;
use crate::ingest::IngestStatus;
use crate::ingest::IngestSummary;

const FILES_FIELD: &str = "files";

/// Ingest the files sent in the multipart `files` field (POST /api/upload)
///
/// Each file succeeds or fails on its own; the request fails only when no
/// file could be processed.
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<IngestSummary>>, ExplorerError> {
    let mut multipart = multipart?;
    let limit = state.explorer.config().ingest.max_request_size;
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExplorerError::from_multipart(&e, limit))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ExplorerError::from_multipart(&e, limit))?;
        files.push((filename, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(ExplorerError::InvalidRequest("No files provided".to_string()));
    }
    info!("POST /api/upload: {} file(s)", files.len());

    let summary = state.explorer.ingestion().ingest_uploads(files).await;
    if summary.status == IngestStatus::Error {
        let message = summary.message.clone();
        return Ok(Json(ApiResponse::failure_with(summary, message)));
    }
    Ok(Json(ApiResponse::success(summary)))
}

/// List the upload directory (GET /api/upload/status)
pub async fn upload_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UploadStatusResponse>>, ExplorerError> {
    let ingestion = state.explorer.ingestion();
    let files = ingestion.uploaded_files().await?;
    Ok(Json(ApiResponse::success(UploadStatusResponse {
        upload_dir: ingestion.upload_dir().to_path_buf(),
        file_count: files.len(),
        files,
    })))
}
