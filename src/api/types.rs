//! Shared types for the HTTP API layer.

use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatService;
use crate::config::AiConfig;
use crate::db::ScanStore;
use crate::inference::BackendRegistry;
use crate::scan::AnalysisOrchestrator;
use crate::urgent_care::{AdvisoryLocator, UrgentCareLocator};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub chat: Arc<ChatService>,
    pub registry: Arc<BackendRegistry>,
    pub store: Arc<dyn ScanStore>,
}

impl ApiContext {
    /// Wire the services from backend configuration and a store.
    pub fn new(config: &AiConfig, store: Arc<dyn ScanStore>) -> Self {
        let registry = Arc::new(BackendRegistry::from_config(config));
        Self::from_parts(
            registry,
            store,
            Arc::new(AdvisoryLocator),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn from_parts(
        registry: Arc<BackendRegistry>,
        store: Arc<dyn ScanStore>,
        locator: Arc<dyn UrgentCareLocator>,
        backend_timeout: Duration,
    ) -> Self {
        let orchestrator = AnalysisOrchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            locator,
            backend_timeout,
        );
        Self {
            orchestrator: Arc::new(orchestrator),
            chat: Arc::new(ChatService::new(Arc::clone(&registry), backend_timeout)),
            registry,
            store,
        }
    }
}

/// Caller identity forwarded by the upstream gateway, injected into request
/// extensions by the owner middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    pub owner_id: String,
}
