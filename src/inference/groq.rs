//! OpenAI-compatible chat completions, as served by Groq.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{language_name, BackendError, BackendKind, ChatRole, ChatTurn, InferenceBackend};
use crate::scan::ImageBuffer;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const CHAT_MODEL: &str = "llama-3.1-8b-instant";
pub const VISION_MODEL: &str = "llama-3.2-11b-vision-preview";

const EMPTY_CHAT_REPLY: &str = "I apologize, but I couldn't generate a response.";

pub struct GroqBackend {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl GroqBackend {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        }
    }

    fn complete(&self, body: &CompletionRequest) -> Result<Option<String>, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| BackendError::from_reqwest(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::from_status("groq", status.as_u16(), body));
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        Ok(first_choice(parsed))
    }
}

#[derive(Serialize)]
struct CompletionRequest {
    model: &'static str,
    messages: Vec<Value>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn first_choice(response: CompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|text| !text.is_empty())
}

fn chat_request(history: &[ChatTurn], message: &str, locale: &str) -> CompletionRequest {
    let system = format!(
        "You are an advanced medical AI assistant. Answer in {}. Provide clear, accurate, \
         and concise health information. Disclaimer: You are an AI, not a doctor.",
        language_name(locale)
    );

    let mut messages = vec![json!({ "role": "system", "content": system })];
    messages.extend(history.iter().map(|turn| {
        let role = match turn.sender {
            ChatRole::User => "user",
            ChatRole::Ai => "assistant",
        };
        json!({ "role": role, "content": turn.text })
    }));
    messages.push(json!({ "role": "user", "content": message }));

    CompletionRequest {
        model: CHAT_MODEL,
        messages,
        temperature: 0.5,
        max_tokens: 1024,
    }
}

fn vision_request(image: &ImageBuffer, prompt: &str) -> CompletionRequest {
    let data_url = format!("data:{};base64,{}", image.mime_type(), image.to_base64());
    CompletionRequest {
        model: VISION_MODEL,
        messages: vec![json!({
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": data_url } },
            ],
        })],
        temperature: 0.1,
        max_tokens: 1024,
    }
}

impl InferenceBackend for GroqBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SecondaryCloud
    }

    fn name(&self) -> String {
        format!("groq:{CHAT_MODEL}")
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn send_message(
        &self,
        history: &[ChatTurn],
        message: &str,
        locale: &str,
    ) -> Result<String, BackendError> {
        let reply = self.complete(&chat_request(history, message, locale))?;
        Ok(reply.unwrap_or_else(|| EMPTY_CHAT_REPLY.to_string()))
    }

    fn analyze_image(&self, image: &ImageBuffer, prompt: &str) -> Result<String, BackendError> {
        self.complete(&vision_request(image, prompt))?
            .ok_or_else(|| BackendError::MalformedResponse("completion had no content".into()))
    }
}
