use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{BackendError, BackendKind, ChatTurn, InferenceBackend};
use crate::scan::ImageBuffer;

/// How a [`MockBackend`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Connection,
    Authentication,
    Unavailable,
    Panic,
}

/// Scriptable backend for tests: canned replies, injected failures and
/// delays, and call counters.
pub struct MockBackend {
    kind: BackendKind,
    chat_reply: String,
    vision_reply: String,
    failure: Option<MockFailure>,
    delay: Option<Duration>,
    configured: bool,
    chat_calls: AtomicUsize,
    vision_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            chat_reply: "Mock reply".to_string(),
            vision_reply: "{}".to_string(),
            failure: None,
            delay: None,
            configured: true,
            chat_calls: AtomicUsize::new(0),
            vision_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_chat_reply(mut self, reply: &str) -> Self {
        self.chat_reply = reply.to_string();
        self
    }

    pub fn with_vision_reply(mut self, reply: &str) -> Self {
        self.vision_reply = reply.to_string();
        self
    }

    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Registered but missing its credential, like a cloud backend with an
    /// empty API key.
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn vision_calls(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.chat_calls() + self.vision_calls()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn respond(&self, reply: &str) -> Result<String, BackendError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match self.failure {
            None => Ok(reply.to_string()),
            Some(MockFailure::Connection) => Err(BackendError::Connection("mock".into())),
            Some(MockFailure::Authentication) => Err(BackendError::Authentication {
                backend: "mock".into(),
                status: 401,
            }),
            Some(MockFailure::Unavailable) => Err(BackendError::Unavailable {
                backend: "mock".into(),
                status: 503,
                body: "model loading".into(),
            }),
            Some(MockFailure::Panic) => panic!("mock backend panicked"),
        }
    }
}

impl InferenceBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn name(&self) -> String {
        format!("mock:{}", self.kind)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn send_message(
        &self,
        _history: &[ChatTurn],
        _message: &str,
        _locale: &str,
    ) -> Result<String, BackendError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(&self.chat_reply)
    }

    fn analyze_image(&self, _image: &ImageBuffer, prompt: &str) -> Result<String, BackendError> {
        self.vision_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        self.respond(&self.vision_reply)
    }
}
