use std::sync::Arc;

use base64::Engine;
use sha2::{Digest, Sha256};

use super::AnalysisError;

/// Anything smaller cannot be a valid PNG or JPEG.
const MIN_IMAGE_BYTES: usize = 67;
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

const DEFAULT_MIME: &str = "image/jpeg";

/// Raw uploaded photo plus its declared media type.
///
/// Cloning shares the bytes; nothing downstream mutates them.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl ImageBuffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: &str) -> Self {
        let mime_type = mime_type.trim();
        Self {
            bytes: bytes.into(),
            mime_type: if mime_type.is_empty() {
                DEFAULT_MIME.to_string()
            } else {
                mime_type.to_string()
            },
        }
    }

    /// Accepts `data:<mime>;base64,<payload>` or bare base64. The media type
    /// embedded in a data URL wins over `fallback_mime`.
    pub fn from_data_url(input: &str, fallback_mime: Option<&str>) -> Result<Self, AnalysisError> {
        let (declared, payload) = match input.find(',') {
            Some(idx) => (parse_data_url_mime(&input[..idx]), &input[idx + 1..]),
            None => (None, input),
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AnalysisError::Decode(format!("Base64 decode failed: {e}")))?;

        let mime = declared
            .or(fallback_mime)
            .unwrap_or(DEFAULT_MIME);
        Ok(Self::new(bytes, mime))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content digest recorded instead of the image itself.
    pub fn image_ref(&self) -> String {
        format!("sha256:{:x}", Sha256::digest(&self.bytes))
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Reject clearly invalid input before decoding.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.bytes.len() < MIN_IMAGE_BYTES {
            return Err(AnalysisError::Decode(
                "Image data too small to be valid".into(),
            ));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AnalysisError::Decode(format!(
                "Image data exceeds {}MB limit",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

fn parse_data_url_mime(header: &str) -> Option<&str> {
    let rest = header.strip_prefix("data:")?;
    let mime = rest.split(';').next()?.trim();
    (!mime.is_empty()).then_some(mime)
}
