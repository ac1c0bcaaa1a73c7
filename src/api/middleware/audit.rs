//! Access logging middleware.
//!
//! Logs every API request with owner, method, path, status and latency.
//! Runs innermost (after the owner middleware has injected `OwnerContext`).

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::OwnerContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let owner = req
        .extensions()
        .get::<OwnerContext>()
        .map(|o| o.owner_id.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let started = Instant::now();
    let response = next.run(req).await;

    tracing::info!(
        owner = %owner,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "API access"
    );
    response
}
