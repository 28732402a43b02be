//! Question answering handlers

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::api::types::ApiResponse;
use crate::errors::ExplorerError;
use crate::rag::QueryEvent;
use crate::rag::RagQuery;
use crate::rag::RagResponse;

/// Answer a question (POST /api/query)
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<RagQuery>, JsonRejection>,
) -> Result<Json<ApiResponse<RagResponse>>, ExplorerError> {
    let Json(req) = payload?;
    info!("POST /api/query: {}", req.question);
    let response = state.explorer.rag().query(req).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Answer a question as Server-Sent Events (GET /api/stream-query)
///
/// Events: `metadata`, then one `message` per token (a JSON string), then
/// `done` with `{answer, token_count}`, or `error` with `{error}`.
pub async fn stream_query(
    State(state): State<AppState>,
    params: Result<Query<RagQuery>, QueryRejection>,
) -> Result<Response, ExplorerError> {
    let Query(req) = params?;
    info!("GET /api/stream-query: {}", req.question);
    req.validate(state.explorer.config().retrieval.max_top_k)?;

    let events = state
        .explorer
        .rag()
        .clone()
        .stream_query(req)
        .map(to_sse_event);

    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));
    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    )
        .into_response())
}

fn to_sse_event(event: QueryEvent) -> Result<Event, axum::Error> {
    match event {
        QueryEvent::Metadata(metadata) => Event::default().event("metadata").json_data(metadata),
        // JSON-encoding keeps newlines inside tokens from breaking the event framing
        QueryEvent::Token(token) => Event::default().event("message").json_data(token),
        QueryEvent::Done {
            answer,
            token_count,
        } => Event::default()
            .event("done")
            .json_data(json!({ "answer": answer, "token_count": token_count })),
        QueryEvent::Error(message) => Event::default()
            .event("error")
            .json_data(json!({ "error": message })),
    }
}
