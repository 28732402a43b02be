//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::types::ApiResponse;
use crate::api::types::ConfigSummary;
use crate::api::types::HealthResponse;
use crate::api::types::RootResponse;
use crate::api::types::ServiceHealth;
use crate::explorer::KnowledgeExplorer;

pub mod documents;
pub mod query;
pub mod upload;

pub use documents::*;
pub use query::*;
pub use upload::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub explorer: Arc<KnowledgeExplorer>,
}

impl AppState {
    pub fn new(explorer: Arc<KnowledgeExplorer>) -> Self {
        Self { explorer }
    }
}

/// Service banner (GET /)
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "Knowledge Explorer API",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Key presence and effective settings (GET /health)
pub async fn service_health(State(state): State<AppState>) -> Json<ApiResponse<ServiceHealth>> {
    let config = state.explorer.config();
    let api_keys = config.api_key_status();
    Json(ApiResponse::success(ServiceHealth {
        status: if api_keys.all_present() {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        api_keys,
        config: ConfigSummary::from_config(config),
    }))
}

/// Health check handler (GET /api/health)
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
