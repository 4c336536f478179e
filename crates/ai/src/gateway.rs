//! Retry/fallback gateway over the generative backends.
//!
//! Every call runs the primary backend through the shared
//! [`RetryPolicy`]; after the retry budget is exhausted the fallback
//! backend (when configured) gets exactly one attempt. If both fail,
//! the error surfaced to the caller is the primary chain's last error,
//! not the fallback's.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use maison_core::pricing::TokenUsage;
use maison_core::retry::RetryPolicy;

use crate::backend::{
    BackendError, GenerationRequest, GenerativeBackend, ImageRequest, InlineImage,
};
use crate::telemetry::OperationLedger;

// ---------------------------------------------------------------------------
// Options / outputs
// ---------------------------------------------------------------------------

/// Per-call generation options. Ephemeral; constructed per call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Number of primary attempts (not primary + 1).
    pub retries: u32,
    /// Backoff base; doubled after each failed attempt.
    pub retry_delay_ms: u64,
    /// Whether the configured fallback backend may be consulted.
    pub use_fallback: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_tokens: None,
            retries: 3,
            retry_delay_ms: 1000,
            use_fallback: true,
        }
    }
}

impl GenerateOptions {
    fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries.max(1),
            base_delay: Duration::from_millis(self.retry_delay_ms),
            multiplier: 2.0,
            ..Default::default()
        }
    }
}

/// A schema-validated structured result plus its usage.
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    pub usage: TokenUsage,
}

/// A plain-text result plus its usage.
#[derive(Debug, Clone)]
pub struct TextOutput {
    pub text: String,
    pub usage: TokenUsage,
}

/// Terminal gateway failure: primary retries exhausted and the
/// fallback (if any) also failed. Carries the primary's last error.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("all attempts failed for {function_id} after {attempts} attempts: {source}")]
    AllAttemptsFailed {
        function_id: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Uniform call surface over primary + optional fallback backends.
pub struct Gateway {
    primary: Arc<dyn GenerativeBackend>,
    fallback: Option<Arc<dyn GenerativeBackend>>,
    ledger: Arc<OperationLedger>,
}

impl Gateway {
    pub fn new(
        primary: Arc<dyn GenerativeBackend>,
        fallback: Option<Arc<dyn GenerativeBackend>>,
        ledger: Arc<OperationLedger>,
    ) -> Self {
        Self {
            primary,
            fallback,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Arc<OperationLedger> {
        &self.ledger
    }

    /// Generate a structured value of type `T`.
    ///
    /// The backend's JSON is deserialized into `T` at this boundary; a
    /// response that fails to deserialize counts as a retry-eligible
    /// failure, exactly like a network error.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        function_id: &str,
        prompt: &str,
        response_schema: serde_json::Value,
        options: &GenerateOptions,
    ) -> Result<Structured<T>, GatewayError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: options.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_schema: Some(response_schema),
        };

        let operation_id = OperationLedger::new_operation_id(function_id);
        self.ledger.start(&operation_id, function_id, &options.model);

        let primary_result = options
            .policy()
            .run(|attempt| {
                let request = &request;
                async move {
                    match self.try_structured::<T>(self.primary.as_ref(), request).await {
                        Ok(ok) => Ok(ok),
                        Err(e) => {
                            tracing::warn!(
                                function_id,
                                backend = self.primary.name(),
                                attempt,
                                error = %e,
                                "Structured generation attempt failed",
                            );
                            Err(e)
                        }
                    }
                }
            })
            .await;

        let last_primary_error = match primary_result {
            Ok((value, usage, finish_reason)) => {
                self.ledger
                    .complete(&operation_id, usage, finish_reason.as_deref());
                return Ok(Structured { value, usage });
            }
            Err(e) => e,
        };

        // One fallback attempt, no further retry loop.
        if options.use_fallback {
            if let Some(fallback) = &self.fallback {
                match self.try_structured::<T>(fallback.as_ref(), &request).await {
                    Ok((value, usage, finish_reason)) => {
                        tracing::info!(
                            function_id,
                            backend = fallback.name(),
                            "Fallback backend served the request",
                        );
                        self.ledger
                            .complete(&operation_id, usage, finish_reason.as_deref());
                        return Ok(Structured { value, usage });
                    }
                    Err(e) => {
                        tracing::warn!(
                            function_id,
                            backend = fallback.name(),
                            error = %e,
                            "Fallback backend also failed",
                        );
                    }
                }
            }
        }

        self.ledger
            .fail(&operation_id, &last_primary_error.to_string(), Some(options.retries));
        Err(GatewayError::AllAttemptsFailed {
            function_id: function_id.to_string(),
            attempts: options.retries,
            source: last_primary_error,
        })
    }

    async fn try_structured<T: DeserializeOwned>(
        &self,
        backend: &dyn GenerativeBackend,
        request: &GenerationRequest,
    ) -> Result<(T, TokenUsage, Option<String>), BackendError> {
        let response = backend.generate_json(request).await?;
        let value: T = serde_json::from_value(response.value).map_err(|e| {
            BackendError::InvalidResponse(format!("response does not match target shape: {e}"))
        })?;
        Ok((value, response.usage, response.finish_reason))
    }

    /// Generate plain text with the same retry/fallback semantics.
    pub async fn generate_text(
        &self,
        function_id: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<TextOutput, GatewayError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: options.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_schema: None,
        };

        let operation_id = OperationLedger::new_operation_id(function_id);
        self.ledger.start(&operation_id, function_id, &options.model);

        let primary_result = options
            .policy()
            .run(|attempt| {
                let request = &request;
                async move {
                    match self.primary.generate_text(request).await {
                        Ok(ok) => Ok(ok),
                        Err(e) => {
                            tracing::warn!(
                                function_id,
                                backend = self.primary.name(),
                                attempt,
                                error = %e,
                                "Text generation attempt failed",
                            );
                            Err(e)
                        }
                    }
                }
            })
            .await;

        let last_primary_error = match primary_result {
            Ok(response) => {
                self.ledger.complete(
                    &operation_id,
                    response.usage,
                    response.finish_reason.as_deref(),
                );
                return Ok(TextOutput {
                    text: response.text,
                    usage: response.usage,
                });
            }
            Err(e) => e,
        };

        if options.use_fallback {
            if let Some(fallback) = &self.fallback {
                if let Ok(response) = fallback.generate_text(&request).await {
                    self.ledger.complete(
                        &operation_id,
                        response.usage,
                        response.finish_reason.as_deref(),
                    );
                    return Ok(TextOutput {
                        text: response.text,
                        usage: response.usage,
                    });
                }
            }
        }

        self.ledger
            .fail(&operation_id, &last_primary_error.to_string(), Some(options.retries));
        Err(GatewayError::AllAttemptsFailed {
            function_id: function_id.to_string(),
            attempts: options.retries,
            source: last_primary_error,
        })
    }

    /// Generate one image: single primary attempt plus one fallback
    /// attempt.
    ///
    /// The image generator owns its own outer retry loop tuned to the
    /// image call shape, so no internal retries happen here.
    pub async fn generate_image(
        &self,
        function_id: &str,
        request: &ImageRequest,
        use_fallback: bool,
    ) -> Result<InlineImage, GatewayError> {
        let operation_id = OperationLedger::new_operation_id(function_id);
        self.ledger.start(&operation_id, function_id, &request.model);

        let primary_error = match self.primary.generate_image(request).await {
            Ok(image) => {
                self.ledger
                    .complete(&operation_id, TokenUsage::default(), Some("IMAGE"));
                return Ok(image);
            }
            Err(e) => {
                tracing::warn!(
                    function_id,
                    backend = self.primary.name(),
                    error = %e,
                    "Image generation attempt failed",
                );
                e
            }
        };

        if use_fallback {
            if let Some(fallback) = &self.fallback {
                if let Ok(image) = fallback.generate_image(request).await {
                    self.ledger
                        .complete(&operation_id, TokenUsage::default(), Some("IMAGE"));
                    return Ok(image);
                }
            }
        }

        self.ledger
            .fail(&operation_id, &primary_error.to_string(), None);
        Err(GatewayError::AllAttemptsFailed {
            function_id: function_id.to_string(),
            attempts: 1,
            source: primary_error,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::backend::{JsonResponse, TextResponse};

    /// Backend that replays a scripted sequence of results.
    struct ScriptedBackend {
        name: &'static str,
        responses: Mutex<VecDeque<Result<serde_json::Value, BackendError>>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(
            name: &'static str,
            responses: Vec<Result<serde_json::Value, BackendError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> Result<serde_json::Value, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::InvalidResponse("script exhausted".into())))
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate_json(
            &self,
            _request: &GenerationRequest,
        ) -> Result<JsonResponse, BackendError> {
            self.next().map(|value| JsonResponse {
                value,
                usage: TokenUsage::new(10, 5),
                finish_reason: Some("STOP".into()),
            })
        }

        async fn generate_text(
            &self,
            _request: &GenerationRequest,
        ) -> Result<TextResponse, BackendError> {
            self.next().map(|value| TextResponse {
                text: value.to_string(),
                usage: TokenUsage::new(10, 5),
                finish_reason: Some("STOP".into()),
            })
        }

        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<InlineImage, BackendError> {
            self.next().map(|_| InlineImage {
                data: "QUJD".into(),
                mime_type: "image/webp".into(),
            })
        }
    }

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    fn fast_options() -> GenerateOptions {
        GenerateOptions {
            retries: 3,
            retry_delay_ms: 1,
            ..Default::default()
        }
    }

    fn api_error() -> BackendError {
        BackendError::Api {
            status: 429,
            body: "rate limited".into(),
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let primary = ScriptedBackend::new("primary", vec![Ok(serde_json::json!({"name": "x"}))]);
        let gateway = Gateway::new(primary.clone(), None, Arc::new(OperationLedger::default()));

        let out: Structured<Named> = gateway
            .generate_structured("f", "p", serde_json::json!({}), &fast_options())
            .await
            .unwrap();
        assert_eq!(out.value.name, "x");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn makes_exactly_n_primary_attempts_before_fallback() {
        let primary = ScriptedBackend::new(
            "primary",
            vec![Err(api_error()), Err(api_error()), Err(api_error())],
        );
        let fallback =
            ScriptedBackend::new("fallback", vec![Ok(serde_json::json!({"name": "fb"}))]);
        let gateway = Gateway::new(
            primary.clone(),
            Some(fallback.clone()),
            Arc::new(OperationLedger::default()),
        );

        let out: Structured<Named> = gateway
            .generate_structured("f", "p", serde_json::json!({}), &fast_options())
            .await
            .unwrap();

        // Exactly N primary attempts, not N+1, then one fallback attempt.
        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(out.value.name, "fb");
    }

    #[tokio::test]
    async fn both_failing_surfaces_primary_last_error() {
        let primary = ScriptedBackend::new(
            "primary",
            vec![
                Err(api_error()),
                Err(api_error()),
                Err(BackendError::Api {
                    status: 500,
                    body: "primary final".into(),
                }),
            ],
        );
        let fallback = ScriptedBackend::new(
            "fallback",
            vec![Err(BackendError::Api {
                status: 503,
                body: "fallback error".into(),
            })],
        );
        let gateway = Gateway::new(
            primary,
            Some(fallback.clone()),
            Arc::new(OperationLedger::default()),
        );

        let err = gateway
            .generate_structured::<Named>("f", "p", serde_json::json!({}), &fast_options())
            .await
            .unwrap_err();

        assert_eq!(fallback.calls(), 1);
        assert_matches!(
            err,
            GatewayError::AllAttemptsFailed {
                attempts: 3,
                source: BackendError::Api { status: 500, .. },
                ..
            }
        );
    }

    #[tokio::test]
    async fn fallback_disabled_is_never_consulted() {
        let primary = ScriptedBackend::new(
            "primary",
            vec![Err(api_error()), Err(api_error()), Err(api_error())],
        );
        let fallback =
            ScriptedBackend::new("fallback", vec![Ok(serde_json::json!({"name": "fb"}))]);
        let gateway = Gateway::new(
            primary,
            Some(fallback.clone()),
            Arc::new(OperationLedger::default()),
        );

        let options = GenerateOptions {
            use_fallback: false,
            ..fast_options()
        };
        let result = gateway
            .generate_structured::<Named>("f", "p", serde_json::json!({}), &options)
            .await;
        assert!(result.is_err());
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn shape_mismatch_is_retry_eligible() {
        // First response is valid JSON of the wrong shape; second matches.
        let primary = ScriptedBackend::new(
            "primary",
            vec![
                Ok(serde_json::json!({"unexpected": true})),
                Ok(serde_json::json!({"name": "second"})),
            ],
        );
        let gateway = Gateway::new(primary.clone(), None, Arc::new(OperationLedger::default()));

        let out: Structured<Named> = gateway
            .generate_structured("f", "p", serde_json::json!({}), &fast_options())
            .await
            .unwrap();
        assert_eq!(out.value.name, "second");
        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test]
    async fn text_generation_retries_then_falls_back() {
        let primary = ScriptedBackend::new(
            "primary",
            vec![Err(api_error()), Err(api_error()), Err(api_error())],
        );
        let fallback = ScriptedBackend::new("fallback", vec![Ok(serde_json::json!("fb"))]);
        let gateway = Gateway::new(
            primary.clone(),
            Some(fallback.clone()),
            Arc::new(OperationLedger::default()),
        );

        let out = gateway.generate_text("t", "p", &fast_options()).await.unwrap();

        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(out.text, "\"fb\"");
    }

    #[tokio::test]
    async fn text_generation_surfaces_primary_last_error() {
        let primary = ScriptedBackend::new(
            "primary",
            vec![
                Err(api_error()),
                Err(api_error()),
                Err(BackendError::Api {
                    status: 500,
                    body: "primary final".into(),
                }),
            ],
        );
        let gateway = Gateway::new(primary, None, Arc::new(OperationLedger::default()));

        let err = gateway
            .generate_text("t", "p", &fast_options())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            GatewayError::AllAttemptsFailed {
                attempts: 3,
                source: BackendError::Api { status: 500, .. },
                ..
            }
        );
    }

    #[tokio::test]
    async fn telemetry_records_success_and_failure() {
        let ledger = Arc::new(OperationLedger::default());
        let primary = ScriptedBackend::new(
            "primary",
            vec![
                Ok(serde_json::json!({"name": "ok"})),
                Err(api_error()),
                Err(api_error()),
                Err(api_error()),
            ],
        );
        let gateway = Gateway::new(primary, None, ledger.clone());

        let _: Structured<Named> = gateway
            .generate_structured("good", "p", serde_json::json!({}), &fast_options())
            .await
            .unwrap();
        let _ = gateway
            .generate_structured::<Named>("bad", "p", serde_json::json!({}), &fast_options())
            .await;

        let snap = ledger.snapshot();
        assert_eq!(snap.total_operations, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.by_function["good"].operations, 1);
    }

    #[tokio::test]
    async fn image_call_makes_single_primary_attempt() {
        let primary = ScriptedBackend::new("primary", vec![Err(api_error())]);
        let fallback = ScriptedBackend::new("fallback", vec![Ok(serde_json::json!({}))]);
        let gateway = Gateway::new(
            primary.clone(),
            Some(fallback.clone()),
            Arc::new(OperationLedger::default()),
        );

        let request = ImageRequest {
            prompt: "scene".into(),
            model: "gemini-2.0-flash-preview-image-generation".into(),
            aspect_ratio: Some("16:9".into()),
            reference: None,
        };
        let image = gateway.generate_image("img", &request, true).await.unwrap();
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(image.mime_type, "image/webp");
    }
}
