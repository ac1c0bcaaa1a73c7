//! Conversational path over the resolved inference backend.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::inference::{BackendRegistry, ChatTurn};

pub const APOLOGY_REPLY: &str = "I apologize, but I am currently having trouble connecting to my AI brain. \
Please try again later, or use the Scan feature which works offline with our heuristic engine.";

/// Longest message accepted from a user.
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Error, Debug, PartialEq)]
pub enum ChatError {
    #[error("No inference backend is configured")]
    BackendUnavailable,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message exceeds {MAX_MESSAGE_CHARS} characters")]
    MessageTooLong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub backend: String,
    /// The backend failed and `reply` is the fixed apology.
    pub degraded: bool,
}

pub struct ChatService {
    registry: Arc<BackendRegistry>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(registry: Arc<BackendRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn reply(
        &self,
        history: Vec<ChatTurn>,
        message: &str,
        locale: &str,
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::MessageTooLong);
        }

        let (backend, name) = self.registry.resolve().ok_or(ChatError::BackendUnavailable)?;

        let message_owned = message.to_string();
        let locale_owned = locale.to_string();
        let call = tokio::task::spawn_blocking(move || {
            backend.send_message(&history, &message_owned, &locale_owned)
        });

        let span = tracing::info_span!("chat_call", backend = %name, locale);
        let outcome = tokio::time::timeout(self.timeout, call).instrument(span).await;

        let failure = match outcome {
            Ok(Ok(Ok(text))) => {
                return Ok(ChatReply {
                    reply: text,
                    backend: name,
                    degraded: false,
                })
            }
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join)) => format!("chat task aborted: {join}"),
            Err(_) => format!("timed out after {}ms", self.timeout.as_millis()),
        };

        tracing::warn!(backend = %name, error = %failure, "Chat backend failed, sending apology");
        Ok(ChatReply {
            reply: APOLOGY_REPLY.to_string(),
            backend: name,
            degraded: true,
        })
    }
}
