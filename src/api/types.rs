//! API request and response types

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ApiKeyStatus;
use crate::config::AppConfig;
use crate::config::VectorStoreProvider;
use crate::ingest::UploadedFile;
use crate::vectorstore::IndexStats;
use crate::vectorstore::NamespaceStats;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// A failure that still carries a payload
    pub fn failure_with(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
        }
    }
}

/// `GET /`
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /health`: key presence and the settings that shape answers
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub api_keys: ApiKeyStatus,
    pub config: ConfigSummary,
}

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub vector_store: VectorStoreProvider,
    pub index_name: String,
    pub region: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub min_relevance_score: f32,
    pub max_upload_size: usize,
}

impl ConfigSummary {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            llm_model: config.llm_model().to_string(),
            embedding_model: config.embeddings.model.clone(),
            embedding_dimension: config.embedding_dimension(),
            vector_store: config.vector_store.provider,
            index_name: config.vector_store.index_name.clone(),
            region: config.vector_store.region.clone(),
            chunk_size: config.ingest.chunk_size,
            chunk_overlap: config.ingest.chunk_overlap,
            top_k: config.retrieval.top_k,
            min_relevance_score: config.retrieval.min_relevance_score,
            max_upload_size: config.ingest.max_upload_size,
        }
    }
}

/// `GET /api/upload/status`
#[derive(Debug, Serialize)]
pub struct UploadStatusResponse {
    pub upload_dir: PathBuf,
    pub file_count: usize,
    pub files: Vec<UploadedFile>,
}

/// `GET /api/documents/stats`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub index_name: String,
    pub total_vectors: u64,
    pub dimension: usize,
    pub namespaces: BTreeMap<String, NamespaceStats>,
}

impl StatsResponse {
    pub fn new(index_name: impl Into<String>, stats: IndexStats) -> Self {
        Self {
            index_name: index_name.into(),
            total_vectors: stats.total_vectors,
            dimension: stats.dimension,
            namespaces: stats.namespaces,
        }
    }
}

/// Result of a delete endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_vectors: Option<usize>,
}
