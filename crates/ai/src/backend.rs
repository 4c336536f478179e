//! The uniform backend contract every generative provider implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use maison_core::pricing::TokenUsage;

/// A structured- or plain-text generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// JSON schema the backend should shape its output to. `None`
    /// requests plain text.
    pub response_schema: Option<serde_json::Value>,
}

/// A single-image generation request.
///
/// Backends cannot batch images in one call; the image generator
/// issues one request per image.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    /// e.g. `"16:9"`. Backend default when `None`.
    pub aspect_ratio: Option<String>,
    /// Optional conditioning reference passed inline.
    pub reference: Option<InlineImage>,
}

/// Inline image bytes, base64-encoded, plus their mime type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

/// Backend response carrying a schema-shaped JSON value.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub value: serde_json::Value,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Backend response carrying plain text.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Errors from a single backend call.
///
/// Every variant is retry-eligible: a malformed or schema-violating
/// response is treated the same as a transient network failure, not as
/// a separate error class.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider responded 2xx but the payload was not usable
    /// (missing candidates, unparseable JSON, schema mismatch).
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Uniform call contract for a generative backend.
///
/// The gateway holds these as trait objects so primary and fallback
/// backends are interchangeable; callers never branch on which backend
/// served a request.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Short backend label used in logs and telemetry.
    fn name(&self) -> &str;

    async fn generate_json(&self, request: &GenerationRequest)
        -> Result<JsonResponse, BackendError>;

    async fn generate_text(&self, request: &GenerationRequest)
        -> Result<TextResponse, BackendError>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage, BackendError>;
}
