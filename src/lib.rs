pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod inference;
pub mod models;
pub mod scan;
pub mod urgent_care;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::AiConfig;
use crate::db::SqliteScanStore;

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(message) = runtime.block_on(serve()) {
        tracing::error!("{message}");
        std::process::exit(1);
    }
}

async fn serve() -> Result<(), String> {
    let db_path = config::database_path();
    let store = SqliteScanStore::open(&db_path)
        .map_err(|e| format!("Cannot open scan database {}: {e}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "Scan database ready");

    let ctx = ApiContext::new(&AiConfig::from_env(), Arc::new(store));

    let mut server = api::start_api_server(&config::bind_addr(), ctx)
        .await
        .map_err(|e| e.to_string())?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}
