//! HTTP API.
//!
//! Exposes scan analysis, scan history and chat as JSON endpoints under
//! `/api/`. The caller is identified by a gateway-forwarded owner header;
//! `api_router()` returns a `Router` that can be mounted on any axum server.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError, ServerSession};
pub use types::{ApiContext, OwnerContext};
