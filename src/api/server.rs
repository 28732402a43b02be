//! HTTP server implementation

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::explorer::KnowledgeExplorer;
use crate::Result;

/// Start the API server
pub async fn serve_api(explorer: Arc<KnowledgeExplorer>, host: &str, port: u16) -> Result<()> {
    info!("🚀 Starting Knowledge Explorer API server...");

    let keys = explorer.config().api_key_status();
    if !keys.all_present() {
        warn!(
            "⚠️  Missing API keys (groq: {}, pinecone: {}, jina: {}); affected calls will fail",
            keys.groq, keys.pinecone, keys.jina
        );
    }

    let cors_enabled = explorer.config().server.enable_cors;
    let app = routes::build_router(AppState::new(explorer));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    if cors_enabled {
        info!("✅ CORS enabled");
    }
    info!("Available endpoints:");
    info!("  GET    /health                              - API keys and config");
    info!("  GET    /api/health                          - Health check");
    info!("  POST   /api/upload                          - Upload PDF/TXT files");
    info!("  GET    /api/upload/status                   - List uploaded files");
    info!("  POST   /api/query                           - Ask a question");
    info!("  GET    /api/stream-query                    - Ask a question (SSE)");
    info!("  GET    /api/documents/stats                 - Index statistics");
    info!("  DELETE /api/documents/filename/:filename    - Delete a document");
    info!("  DELETE /api/documents/clear-all             - Delete everything");

    axum::serve(listener, app).await?;

    Ok(())
}
