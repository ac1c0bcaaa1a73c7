//! Gateway-forwarded owner identity.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! owner id in `X-Owner-Id`; this middleware only checks it is present and
//! well-formed, then injects `OwnerContext` for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::OwnerContext;

pub const OWNER_HEADER: &str = "X-Owner-Id";

const MAX_OWNER_ID_LEN: usize = 128;

pub async fn require_owner(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_owner_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_owner_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let owner_id = req
        .headers()
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_valid_owner_id(v))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    req.extensions_mut().insert(OwnerContext { owner_id });
    Ok(next.run(req).await)
}

fn is_valid_owner_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_OWNER_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
}
