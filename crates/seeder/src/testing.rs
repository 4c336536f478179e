//! Shared test doubles for the pipeline modules.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use maison_ai::{
    BackendError, Gateway, GenerateOptions, GenerationRequest, GenerativeBackend, ImageRequest,
    InlineImage, OperationLedger,
};
use maison_core::pricing::TokenUsage;

/// Backend double that answers by response shape.
///
/// The first `required` property of the request's response schema keys
/// the canned answer, so one stub serves every structured call in the
/// pipeline without prompt sniffing. Tests script failures or custom
/// payloads per key via [`StubBackend::push`].
pub(crate) struct StubBackend {
    overrides: Mutex<HashMap<String, VecDeque<Result<serde_json::Value, BackendError>>>>,
    image_results: Mutex<VecDeque<Result<(), BackendError>>>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            overrides: Mutex::new(HashMap::new()),
            image_results: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue one response for the given shape key; queued responses are
    /// consumed before the canned default.
    pub fn push(&self, key: &str, result: Result<serde_json::Value, BackendError>) {
        self.overrides
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queue an image outcome; an empty queue means images succeed.
    pub fn push_image(&self, result: Result<(), BackendError>) {
        self.image_results.lock().unwrap().push_back(result);
    }

    fn shape_key(request: &GenerationRequest) -> String {
        request
            .response_schema
            .as_ref()
            .and_then(|s| s["required"][0].as_str())
            .unwrap_or("text")
            .to_string()
    }

    fn canned(key: &str) -> Result<serde_json::Value, BackendError> {
        let bilingual = |en: &str| serde_json::json!({ "en": en, "ar": format!("{en}-ar") });
        let value = match key {
            "title" => serde_json::json!({
                "title": bilingual("Stub Style"),
                "description": bilingual("A stubbed description"),
                "characteristics": [bilingual("clean lines")],
                "material_names": ["Marble", "Velvet"],
                "color_palette": ["Ivory", "Sage"],
            }),
            "narrative" => serde_json::json!({ "narrative": bilingual("Soft light falls.") }),
            "guidance" => serde_json::json!({
                "guidance": bilingual("Keep it open"),
                "lighting": bilingual("Layered warm light"),
                "layout": bilingual("Anchor on the window"),
                "material_names": ["Marble"],
            }),
            "approach_id" => serde_json::json!({
                "approach_id": "",
                "color_id": "",
                "confidence": 0.0,
                "reasoning": bilingual("no opinion"),
            }),
            "results" => serde_json::json!({ "results": [] }),
            "description" => serde_json::json!({ "description": bilingual("A catalog entry") }),
            other => {
                return Err(BackendError::InvalidResponse(format!(
                    "no canned response for shape key {other}"
                )))
            }
        };
        Ok(value)
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_json(
        &self,
        request: &GenerationRequest,
    ) -> Result<maison_ai::JsonResponse, BackendError> {
        let key = Self::shape_key(request);
        let scripted = self
            .overrides
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());
        let value = match scripted {
            Some(result) => result?,
            None => Self::canned(&key)?,
        };
        Ok(maison_ai::JsonResponse {
            value,
            usage: TokenUsage::new(20, 10),
            finish_reason: Some("STOP".into()),
        })
    }

    async fn generate_text(
        &self,
        _request: &GenerationRequest,
    ) -> Result<maison_ai::TextResponse, BackendError> {
        Ok(maison_ai::TextResponse {
            text: "stub text".into(),
            usage: TokenUsage::new(20, 10),
            finish_reason: Some("STOP".into()),
        })
    }

    async fn generate_image(
        &self,
        _request: &ImageRequest,
    ) -> Result<InlineImage, BackendError> {
        let scripted = self.image_results.lock().unwrap().pop_front();
        match scripted {
            Some(Err(e)) => Err(e),
            _ => Ok(InlineImage {
                // "stub-image-bytes" in standard base64.
                data: "c3R1Yi1pbWFnZS1ieXRlcw==".into(),
                mime_type: "image/webp".into(),
            }),
        }
    }
}

pub(crate) fn stub_gateway(backend: Arc<StubBackend>) -> Arc<Gateway> {
    Arc::new(Gateway::new(
        backend,
        None,
        Arc::new(OperationLedger::default()),
    ))
}

/// Options that keep retry sleeps out of the test clock.
pub(crate) fn fast_options() -> GenerateOptions {
    GenerateOptions {
        retries: 2,
        retry_delay_ms: 1,
        ..Default::default()
    }
}

pub(crate) fn api_error() -> BackendError {
    BackendError::Api {
        status: 429,
        body: "rate limited".into(),
    }
}
