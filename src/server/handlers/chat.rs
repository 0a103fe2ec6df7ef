use std::sync::Arc;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::graph::{CanvasPayload, Mode};
use crate::pipeline::PipelineRequest;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub user_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub canvas_data: Option<CanvasPayload>,
}

/// Runs one message through the pipeline.
///
/// Well-formed requests always get a 200: pipeline failures arrive as an
/// `Error: ...` answer with `canvas_data: null`.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, ApiError> {
    if body.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    tracing::debug!(
        user_id = body.user_id.as_deref().unwrap_or("anonymous"),
        mode = body.mode.as_str(),
        "Chat request received"
    );

    let result = state
        .pipeline
        .run(PipelineRequest::new(body.message, body.mode))
        .await;

    Ok(Json(ChatReply {
        answer: result.answer,
        canvas_data: result.canvas,
    }))
}
