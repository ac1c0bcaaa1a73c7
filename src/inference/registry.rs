use std::collections::HashMap;
use std::sync::Arc;

use super::gemini::GeminiBackend;
use super::groq::GroqBackend;
use super::ollama::OllamaBackend;
use super::{BackendDescriptor, BackendKind, InferenceBackend};
use crate::config::AiConfig;

/// Configured backends plus their ranking. Immutable once built, so resolution
/// is a lookup that needs no locking.
pub struct BackendRegistry {
    order: Vec<BackendKind>,
    backends: HashMap<BackendKind, Arc<dyn InferenceBackend>>,
}

impl BackendRegistry {
    /// No backends: every analysis takes the heuristic path.
    pub fn empty() -> Self {
        Self::with_backends(None, Vec::new())
    }

    /// Register explicit backends (one per kind; later entries replace
    /// earlier ones).
    pub fn with_backends(
        primary: Option<BackendKind>,
        backends: Vec<Arc<dyn InferenceBackend>>,
    ) -> Self {
        let backends = backends.into_iter().map(|b| (b.kind(), b)).collect();
        Self {
            order: priority_order(primary),
            backends,
        }
    }

    /// Build clients for every backend whose credential or target is present.
    pub fn from_config(config: &AiConfig) -> Self {
        let mut backends: Vec<Arc<dyn InferenceBackend>> = Vec::new();

        if let Some(base_url) = &config.ollama_base_url {
            backends.push(Arc::new(OllamaBackend::new(
                base_url,
                &config.ollama_model,
                &config.ollama_vision_model,
                config.timeout_secs,
            )));
        }
        if let Some(key) = &config.groq_api_key {
            backends.push(Arc::new(GroqBackend::new(
                &config.groq_base_url,
                key,
                config.timeout_secs,
            )));
        }
        if let Some(key) = &config.gemini_api_key {
            backends.push(Arc::new(GeminiBackend::new(
                key,
                &config.gemini_model,
                config.timeout_secs,
            )));
        }

        let registry = Self::with_backends(config.provider, backends);
        tracing::info!(
            order = ?registry.order,
            configured = registry.backends.len(),
            "Inference backends registered"
        );
        registry
    }

    /// First configured backend in priority order, with its name. `None`
    /// means heuristics only.
    pub fn resolve(&self) -> Option<(Arc<dyn InferenceBackend>, String)> {
        self.order.iter().find_map(|kind| {
            self.backends
                .get(kind)
                .filter(|backend| backend.is_configured())
                .map(|backend| (Arc::clone(backend), backend.name()))
        })
    }

    /// Ranked view of all three slots.
    pub fn descriptors(&self) -> Vec<BackendDescriptor> {
        self.order
            .iter()
            .enumerate()
            .map(|(idx, kind)| {
                let backend = self.backends.get(kind);
                BackendDescriptor {
                    name: backend
                        .map(|b| b.name())
                        .unwrap_or_else(|| kind.vendor().to_string()),
                    kind: *kind,
                    priority: idx as u8 + 1,
                    available: backend.is_some_and(|b| b.is_configured()),
                }
            })
            .collect()
    }
}

/// Primary first, then the default order without it.
pub fn priority_order(primary: Option<BackendKind>) -> Vec<BackendKind> {
    primary
        .into_iter()
        .chain(
            BackendKind::DEFAULT_ORDER
                .into_iter()
                .filter(|kind| Some(*kind) != primary),
        )
        .collect()
}
