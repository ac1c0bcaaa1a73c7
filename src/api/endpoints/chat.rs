//! Chat endpoint.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OwnerContext};
use crate::chat::ChatReply;
use crate::inference::ChatTurn;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// `POST /api/chat/send`: one reply from the resolved backend. A failing
/// backend yields the apology text, not an error.
pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    tracing::debug!(
        owner = %owner.owner_id,
        history = req.history.len(),
        language = %req.language,
        "Chat message received"
    );
    let reply = ctx
        .chat
        .reply(req.history, &req.message, &req.language)
        .await?;
    Ok(Json(reply))
}
