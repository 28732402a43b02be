//! Document management handlers

use axum::extract::Path;
use axum::extract::State;
use axum::Json;
use tracing::info;
use tracing::warn;

use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::DeleteResponse;
use crate::api::types::StatsResponse;
use crate::errors::ExplorerError;

/// Index statistics (GET /api/documents/stats)
pub async fn document_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsResponse>>, ExplorerError> {
    let stats = state.explorer.stats().await?;
    info!("📊 Stats requested: {} vectors", stats.total_vectors);
    Ok(Json(ApiResponse::success(StatsResponse::new(
        &state.explorer.config().vector_store.index_name,
        stats,
    ))))
}

/// Delete every chunk of one document (DELETE /api/documents/filename/:filename)
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ExplorerError> {
    if filename.trim().is_empty() {
        return Err(ExplorerError::InvalidRequest("Filename must not be empty".to_string()));
    }
    info!("🗑️  Deleting all chunks for: {}", filename);
    let deleted = state.explorer.delete_document(&filename).await?;
    Ok(Json(ApiResponse::success(DeleteResponse {
        message: format!("Deleted all chunks from document: {filename}"),
        filename: Some(filename),
        deleted_vectors: Some(deleted),
    })))
}

/// Delete every vector (DELETE /api/documents/clear-all)
pub async fn clear_documents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ExplorerError> {
    warn!("⚠️  Clearing all documents from the knowledge base");
    state.explorer.clear().await?;
    Ok(Json(ApiResponse::success(DeleteResponse {
        message: "All documents have been deleted from the knowledge base".to_string(),
        filename: None,
        deleted_vectors: None,
    })))
}
