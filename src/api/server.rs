//! API server lifecycle: bind, spawn the axum server in a background task,
//! return a handle with a shutdown channel.

use std::net::SocketAddr;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Metadata for a running server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSession {
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ApiServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Ask the server to stop after in-flight requests finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve the API router on it. Port `0` picks an ephemeral
/// port; the chosen one is in `session.port`.
pub async fn start_api_server(addr: &str, ctx: ApiContext) -> Result<ApiServer, ServerError> {
    let socket: SocketAddr = addr
        .parse()
        .map_err(|_| ServerError::InvalidAddress(addr.to_string()))?;

    let listener = tokio::net::TcpListener::bind(socket)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let local = listener.local_addr().map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    let app = api_router(ctx);
    let session = ServerSession {
        server_addr: local.to_string(),
        port: local.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(addr = %local, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::db::SqliteScanStore;
    use crate::inference::BackendRegistry;
    use crate::urgent_care::NoLocator;

    fn test_ctx() -> ApiContext {
        ApiContext::from_parts(
            Arc::new(BackendRegistry::empty()),
            Arc::new(SqliteScanStore::in_memory().unwrap()),
            Arc::new(NoLocator),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn serves_health_over_tcp() {
        let mut server = start_api_server("127.0.0.1:0", test_ctx())
            .await
            .expect("server should start");
        assert!(server.session.port > 0);

        let url = format!("http://127.0.0.1:{}/api/health", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_owner() {
        let mut server = start_api_server("127.0.0.1:0", test_ctx()).await.unwrap();

        let url = format!("http://127.0.0.1:{}/api/scans", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.shutdown();
    }

    #[tokio::test]
    async fn invalid_address_is_rejected() {
        let err = start_api_server("not-an-address", test_ctx())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ServerError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_api_server("127.0.0.1:0", test_ctx()).await.unwrap();
        server.shutdown();
        server.shutdown();
        server.wait().await;
    }
}
