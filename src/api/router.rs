//! HTTP router.
//!
//! Routes are nested under `/api/`. Everything except `/api/health` sits
//! behind the owner middleware.
//!
//! Middleware stack (outermost → innermost):
//! 1. Owner identity → 2. Access log

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Analyze bodies carry a base64 photo of up to 50 MB (~67 MB encoded).
pub const ANALYZE_BODY_LIMIT: usize = 70 * 1024 * 1024;

/// Build the API router.
///
/// Middleware reads `Extension<ApiContext>` (outermost layer); handlers use
/// `State<ApiContext>` from `with_state`.
pub fn api_router(ctx: ApiContext) -> Router {
    // Layers apply bottom (outermost) to top (innermost).
    // Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/backends", get(endpoints::backends::list))
        .route("/scans", get(endpoints::scans::list))
        .route(
            "/scans/analyze",
            post(endpoints::scans::analyze).layer(DefaultBodyLimit::max(ANALYZE_BODY_LIMIT)),
        )
        .route(
            "/scans/:id",
            get(endpoints::scans::detail).delete(endpoints::scans::delete),
        )
        .route("/scans/:id/restore", post(endpoints::scans::restore))
        .route("/chat/send", post(endpoints::chat::send))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::owner::require_owner))
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
}
