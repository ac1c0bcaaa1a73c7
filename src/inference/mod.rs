//! External multimodal inference backends.
//!
//! Every backend is a blocking HTTP client behind [`InferenceBackend`]. The
//! [`registry::BackendRegistry`] ranks them and resolves the first one whose
//! configuration is present; callers run the blocking calls off the async
//! runtime.

pub mod gemini;
pub mod groq;
pub mod mock;
pub mod ollama;
pub mod registry;

pub use mock::MockBackend;
pub use registry::BackendRegistry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scan::ImageBuffer;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection refused by {0}")]
    Connection(String),

    #[error("Authentication rejected by {backend} (status {status})")]
    Authentication { backend: String, status: u16 },

    #[error("{backend} is temporarily unavailable (status {status}): {body}")]
    Unavailable {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("{backend} returned error (status {status}): {body}")]
    Http {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Network(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Map a non-success HTTP status from `backend` onto the failure taxonomy.
    pub fn from_status(backend: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Authentication {
                backend: backend.to_string(),
                status,
            },
            429 | 503 => Self::Unavailable {
                backend: backend.to_string(),
                status,
                body,
            },
            _ => Self::Http {
                backend: backend.to_string(),
                status,
                body,
            },
        }
    }

    pub fn from_reqwest(e: reqwest::Error, target: &str, timeout_secs: u64) -> Self {
        if e.is_connect() {
            Self::Connection(target.to_string())
        } else if e.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// The three backend slots, independent of vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    Local,
    SecondaryCloud,
    PrimaryCloud,
}

impl BackendKind {
    /// Fallback order when no primary is configured.
    pub const DEFAULT_ORDER: [BackendKind; 3] = [
        BackendKind::Local,
        BackendKind::SecondaryCloud,
        BackendKind::PrimaryCloud,
    ];

    /// Parse an `AI_PROVIDER` value. Accepts slot names and vendor names.
    pub fn from_provider(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Some(Self::Local),
            "secondary" | "groq" => Some(Self::SecondaryCloud),
            "primary" | "gemini" => Some(Self::PrimaryCloud),
            _ => None,
        }
    }

    pub fn vendor(&self) -> &'static str {
        match self {
            Self::Local => "ollama",
            Self::SecondaryCloud => "groq",
            Self::PrimaryCloud => "gemini",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.vendor())
    }
}

/// Ranked view of one backend slot, built per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDescriptor {
    pub name: String,
    pub kind: BackendKind,
    pub priority: u8,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    #[serde(alias = "human")]
    User,
    #[serde(alias = "assistant", alias = "model")]
    Ai,
}

/// One prior message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    #[serde(alias = "role")]
    pub sender: ChatRole,
    #[serde(alias = "content")]
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: &str) -> Self {
        Self {
            sender: ChatRole::User,
            text: text.to_string(),
        }
    }

    pub fn ai(text: &str) -> Self {
        Self {
            sender: ChatRole::Ai,
            text: text.to_string(),
        }
    }
}

/// A chat-capable, vision-capable inference service.
///
/// Calls block; run them on a blocking task.
pub trait InferenceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Model-qualified name for logs and descriptors.
    fn name(&self) -> String;

    /// Whether the credential or connection target this backend needs is
    /// present. Unconfigured backends are never resolved.
    fn is_configured(&self) -> bool {
        true
    }

    fn send_message(
        &self,
        history: &[ChatTurn],
        message: &str,
        locale: &str,
    ) -> Result<String, BackendError>;

    fn analyze_image(&self, image: &ImageBuffer, prompt: &str) -> Result<String, BackendError>;
}

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ru", "Russian"),
];

/// Language name for a locale tag such as `es` or `es-ES`. Unknown tags read
/// as English.
pub fn language_name(locale: &str) -> &'static str {
    let code = locale
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(tag, _)| *tag == code)
        .map(|(_, name)| *name)
        .unwrap_or("English")
}

pub fn is_english(locale: &str) -> bool {
    language_name(locale) == "English"
}
