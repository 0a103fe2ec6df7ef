use std::sync::Arc;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({"status": "Backend Running"}))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "retrieval_available": state.pipeline.retrieval_available(),
        "model": state.llm().model(),
        "uptime_secs": state.uptime_secs()
    }))
}
