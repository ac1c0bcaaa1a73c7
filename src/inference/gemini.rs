//! Google Gemini `generateContent` over REST.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{BackendError, BackendKind, ChatRole, ChatTurn, InferenceBackend};
use crate::scan::ImageBuffer;

pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiBackend {
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiBackend {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Self {
        Self::with_base_url(API_BASE_URL, api_key, model, timeout_secs)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs,
        }
    }

    fn generate(&self, body: &Value) -> Result<String, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| BackendError::from_reqwest(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::from_status("gemini", status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        response_text(parsed)
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, BackendError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(BackendError::MalformedResponse("no text in first candidate".into()));
    }
    Ok(text)
}

fn chat_body(history: &[ChatTurn], message: &str, locale: &str) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            let role = match turn.sender {
                ChatRole::User => "user",
                ChatRole::Ai => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.text }] })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": format!("[Language: {locale}] {message}") }],
    }));

    json!({
        "contents": contents,
        "generationConfig": { "maxOutputTokens": 1000 },
    })
}

fn vision_body(image: &ImageBuffer, prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": prompt },
                { "inlineData": { "mimeType": image.mime_type(), "data": image.to_base64() } },
            ],
        }],
    })
}

impl InferenceBackend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PrimaryCloud
    }

    fn name(&self) -> String {
        format!("gemini:{}", self.model)
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
        self.generate(&chat_body(history, message, locale))
    }

    fn analyze_image(&self, image: &ImageBuffer, prompt: &str) -> Result<String, BackendError> {
        self.generate(&vision_body(image, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_uses_model_role_and_language_tag() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::ai("hello")];
        let body = chat_body(&history, "how are my eyes?", "de");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "[Language: de] how are my eyes?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn vision_body_inlines_image() {
        let image = ImageBuffer::new(vec![1u8, 2, 3], "image/jpeg");
        let body = vision_body(&image, "analyze");
        let inline = &body["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(inline["mimeType"], "image/jpeg");
        assert_eq!(inline["data"], "AQID");
    }

    #[test]
    fn response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"result\":"},{"text":"\"Healthy\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(parsed).unwrap(), r#"{"result":"Healthy"}"#);
    }

    #[test]
    fn blocked_response_is_malformed() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[{}]}"#).unwrap();
        assert!(matches!(response_text(parsed), Err(BackendError::MalformedResponse(_))));
    }
}
