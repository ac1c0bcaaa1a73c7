use std::path::PathBuf;

use crate::inference::{gemini, groq, ollama, BackendKind};

/// Application-level constants
pub const APP_NAME: &str = "VitaScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Filter applied when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,vitascan_lib=debug"
}

/// Get the application data directory: ~/VitaScan/, or ./VitaScan when no
/// home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// SQLite file holding scan records.
pub fn database_path() -> PathBuf {
    app_data_dir().join("vitascan.db")
}

/// HTTP listen address from `VITASCAN_BIND`.
pub fn bind_addr() -> String {
    non_empty(std::env::var("VITASCAN_BIND").ok()).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}

/// Backend credentials, connection targets and models.
///
/// A backend counts as configured when its credential or target is `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub provider: Option<BackendKind>,
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    pub ollama_vision_model: String,
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: None,
            ollama_base_url: None,
            ollama_model: ollama::DEFAULT_MODEL.to_string(),
            ollama_vision_model: ollama::DEFAULT_VISION_MODEL.to_string(),
            groq_api_key: None,
            groq_base_url: groq::DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_model: gemini::DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_empty(lookup(key));
        let defaults = Self::default();

        let provider = get("AI_PROVIDER").and_then(|value| {
            let kind = BackendKind::from_provider(&value);
            if kind.is_none() {
                tracing::warn!(provider = %value, "Unknown AI_PROVIDER, using default order");
            }
            kind
        });

        let timeout_secs = get("AI_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.timeout_secs);

        Self {
            provider,
            ollama_base_url: get("OLLAMA_BASE_URL"),
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            ollama_vision_model: get("OLLAMA_VISION_MODEL").unwrap_or(defaults.ollama_vision_model),
            groq_api_key: get("GROQ_API_KEY"),
            groq_base_url: get("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            timeout_secs,
        }
    }

    pub fn is_configured(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Local => self.ollama_base_url.is_some(),
            BackendKind::SecondaryCloud => self.groq_api_key.is_some(),
            BackendKind::PrimaryCloud => self.gemini_api_key.is_some(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("VitaScan"));
        assert!(database_path().starts_with(app_data_dir()));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn empty_environment_configures_nothing() {
        let config = AiConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AiConfig::default());
        for kind in BackendKind::DEFAULT_ORDER {
            assert!(!config.is_configured(kind));
        }
    }

    #[test]
    fn keys_and_overrides_are_read() {
        let config = AiConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "gemini"),
            ("GROQ_API_KEY", "gsk-test"),
            ("GEMINI_API_KEY", "  "),
            ("OLLAMA_BASE_URL", "http://gpu:11434"),
            ("OLLAMA_MODEL", "llama3.1"),
            ("AI_TIMEOUT_SECS", "12"),
        ]));
        assert_eq!(config.provider, Some(BackendKind::PrimaryCloud));
        assert!(config.is_configured(BackendKind::SecondaryCloud));
        assert!(!config.is_configured(BackendKind::PrimaryCloud));
        assert!(config.is_configured(BackendKind::Local));
        assert_eq!(config.ollama_model, "llama3.1");
        assert_eq!(config.ollama_vision_model, "llama3.2-vision");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn bad_timeout_and_provider_fall_back() {
        let config = AiConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "watson"),
            ("AI_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.provider, None);
        assert_eq!(config.timeout_secs, DEFAULT_AI_TIMEOUT_SECS);
    }
}
