//! REST client for a Gemini-compatible generative API.
//!
//! Wraps the `generateContent` endpoint using [`reqwest`]. Structured
//! output is requested via `responseMimeType`/`responseSchema`; images
//! travel as inline base64 parts in both directions.

use async_trait::async_trait;
use serde::Deserialize;

use maison_core::pricing::TokenUsage;

use crate::backend::{
    BackendError, GenerationRequest, GenerativeBackend, ImageRequest, InlineImage, JsonResponse,
    TextResponse,
};

/// HTTP backend for one Gemini-compatible endpoint + key pair.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    name: String,
}

impl HttpBackend {
    /// Create a backend client.
    ///
    /// * `name`     - label used in logs/telemetry, e.g. `"primary"`.
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            name: name.into(),
        }
    }

    /// Create a backend reusing an existing [`reqwest::Client`]
    /// (connection pooling across primary and fallback).
    pub fn with_client(
        client: reqwest::Client,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            name: name.into(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    async fn post_generate(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<GenerateContentResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }

    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
        });
        if let Some(max) = request.max_tokens {
            generation_config["maxOutputTokens"] = serde_json::json!(max);
        }
        if let Some(ref schema) = request.response_schema {
            generation_config["responseMimeType"] = serde_json::json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }

        serde_json::json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
            "generationConfig": generation_config,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    fn usage(&self) -> TokenUsage {
        match &self.usage_metadata {
            Some(u) => TokenUsage::new(u.prompt_token_count, u.candidates_token_count),
            None => TokenUsage::default(),
        }
    }

    /// First candidate's concatenated text parts, or an error when the
    /// response carries no text at all.
    fn text(&self) -> Result<(String, Option<String>), BackendError> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| BackendError::InvalidResponse("response has no candidates".into()))?;
        let text: String = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(BackendError::InvalidResponse(
                "candidate contains no text parts".into(),
            ));
        }
        Ok((text, candidate.finish_reason.clone()))
    }

    /// First inline image part across all candidates.
    fn inline_image(&self) -> Result<InlineImage, BackendError> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| InlineImage {
                data: d.data.clone(),
                mime_type: d.mime_type.clone(),
            })
            .ok_or_else(|| BackendError::InvalidResponse("response has no inline image".into()))
    }
}

// ---------------------------------------------------------------------------
// Backend impl
// ---------------------------------------------------------------------------

#[async_trait]
impl GenerativeBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_json(
        &self,
        request: &GenerationRequest,
    ) -> Result<JsonResponse, BackendError> {
        let response = self
            .post_generate(&request.model, Self::request_body(request))
            .await?;
        let usage = response.usage();
        let (text, finish_reason) = response.text()?;

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            BackendError::InvalidResponse(format!("candidate text is not valid JSON: {e}"))
        })?;

        Ok(JsonResponse {
            value,
            usage,
            finish_reason,
        })
    }

    async fn generate_text(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextResponse, BackendError> {
        let response = self
            .post_generate(&request.model, Self::request_body(request))
            .await?;
        let usage = response.usage();
        let (text, finish_reason) = response.text()?;

        Ok(TextResponse {
            text,
            usage,
            finish_reason,
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage, BackendError> {
        let mut parts = vec![serde_json::json!({ "text": request.prompt })];
        if let Some(ref reference) = request.reference {
            parts.push(serde_json::json!({
                "inlineData": {
                    "mimeType": reference.mime_type,
                    "data": reference.data,
                }
            }));
        }

        let mut generation_config = serde_json::json!({
            "responseModalities": ["IMAGE"],
        });
        if let Some(ref ratio) = request.aspect_ratio {
            generation_config["imageConfig"] = serde_json::json!({ "aspectRatio": ratio });
        }

        let body = serde_json::json!({
            "contents": [{ "parts": parts }],
            "generationConfig": generation_config,
        });

        let response = self.post_generate(&request.model, body).await?;
        response.inline_image()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
