//! Inference backend status.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::inference::BackendDescriptor;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendsResponse {
    /// Ranked, primary first.
    pub backends: Vec<BackendDescriptor>,
    /// Backend the next request would use; `None` means heuristics only.
    pub resolved: Option<String>,
}

/// `GET /api/backends`
pub async fn list(State(ctx): State<ApiContext>) -> Json<BackendsResponse> {
    Json(BackendsResponse {
        backends: ctx.registry.descriptors(),
        resolved: ctx.registry.resolve().map(|(_, name)| name),
    })
}
