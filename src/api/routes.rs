//! API route definitions

use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers;
use super::handlers::AppState;
use crate::config::ServerConfig;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Create RESTful API router
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        // Uploads
        .route("/upload", post(handlers::upload_files))
        .route("/upload/status", get(handlers::upload_status))
        // Questions
        .route("/query", post(handlers::query))
        .route("/stream-query", get(handlers::stream_query))
        // Document management
        .route("/documents/stats", get(handlers::document_stats))
        .route(
            "/documents/filename/:filename",
            delete(handlers::delete_document),
        )
        .route("/documents/clear-all", delete(handlers::clear_documents))
}

/// Full application router with middleware
pub fn build_router(state: AppState) -> Router {
    let config = state.explorer.config();
    let body_limit = config.ingest.max_request_size;
    let cors = cors_layer(&config.server);

    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::service_health))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(process_time))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app.with_state(state)
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if !config.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️  Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any),
    )
}

/// Report handling time in seconds on every response
async fn process_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = format!("{:.6}", started.elapsed().as_secs_f64());
    if let Ok(value) = HeaderValue::from_str(&elapsed) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
