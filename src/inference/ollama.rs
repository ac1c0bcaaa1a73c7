use serde::{Deserialize, Serialize};

use super::{is_english, language_name, BackendError, BackendKind, ChatRole, ChatTurn, InferenceBackend};
use crate::scan::ImageBuffer;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_VISION_MODEL: &str = "llama3.2-vision";

/// Ollama HTTP client for a local Llama instance.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    vision_model: String,
    timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str, vision_model: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            vision_model: vision_model.to_string(),
            timeout_secs,
        }
    }

    #[cfg(test)]
    pub fn default_local(timeout_secs: u64) -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_VISION_MODEL, timeout_secs)
    }

    fn client(&self) -> Result<reqwest::blocking::Client, BackendError> {
        reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client()?
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| BackendError::from_reqwest(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::from_status("ollama", status.as_u16(), body));
        }

        response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }

    fn chat_request(&self, history: &[ChatTurn], message: &str, locale: &str) -> ChatRequest<'_> {
        let mut messages: Vec<ChatMessage> = history
            .iter()
            .map(|turn| ChatMessage {
                role: match turn.sender {
                    ChatRole::User => "user",
                    ChatRole::Ai => "assistant",
                },
                content: turn.text.clone(),
            })
            .collect();

        let content = if is_english(locale) {
            message.to_string()
        } else {
            format!("Please respond in {}. {message}", language_name(locale))
        };
        messages.push(ChatMessage {
            role: "user",
            content,
        });

        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: Options {
                temperature: 0.7,
                num_predict: 1000,
            },
        }
    }

    fn generate_request<'a>(&'a self, image: &ImageBuffer, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.vision_model,
            prompt,
            images: vec![image.to_base64()],
            stream: false,
            options: Options {
                temperature: 0.5,
                num_predict: 2000,
            },
        }
    }
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: Options,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: Options,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl InferenceBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    fn send_message(
        &self,
        history: &[ChatTurn],
        message: &str,
        locale: &str,
    ) -> Result<String, BackendError> {
        let body = self.chat_request(history, message, locale);
        let parsed: ChatResponse = self.post("/api/chat", &body)?;
        Ok(parsed.message.content)
    }

    fn analyze_image(&self, image: &ImageBuffer, prompt: &str) -> Result<String, BackendError> {
        let body = self.generate_request(image, prompt);
        let parsed: GenerateResponse = self.post("/api/generate", &body)?;
        Ok(parsed.response)
    }
}
