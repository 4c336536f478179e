//! Provider configuration, built once at startup from the environment.
//!
//! No lazy first-use initialization: the binary constructs a
//! [`ProviderConfig`] before any generation work begins and passes it
//! down. A missing primary key is a hard startup failure; a missing
//! fallback key just disables fallback.

use std::sync::Arc;

use crate::gateway::Gateway;
use crate::http::HttpBackend;
use crate::telemetry::OperationLedger;

/// Default API root for the primary backend.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default structured/text model.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

/// Default image-capable model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Startup-time provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub primary_api_key: String,
    /// `None` disables the fallback backend.
    pub fallback_api_key: Option<String>,
    pub text_model: String,
    pub image_model: String,
}

impl ProviderConfig {
    /// Read configuration from the process environment.
    ///
    /// * `MAISON_AI_API_KEY`          - required primary key.
    /// * `MAISON_AI_FALLBACK_API_KEY` - optional; absence is logged and
    ///   degrades fallback to unavailable.
    /// * `MAISON_AI_BASE_URL`, `MAISON_AI_TEXT_MODEL`,
    ///   `MAISON_AI_IMAGE_MODEL`      - optional overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let primary_api_key = std::env::var("MAISON_AI_API_KEY")
            .map_err(|_| ConfigError::MissingEnv("MAISON_AI_API_KEY"))?;

        let fallback_api_key = std::env::var("MAISON_AI_FALLBACK_API_KEY").ok();
        if fallback_api_key.is_none() {
            tracing::warn!("MAISON_AI_FALLBACK_API_KEY not set; provider fallback unavailable");
        }

        Ok(Self {
            base_url: std::env::var("MAISON_AI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            primary_api_key,
            fallback_api_key,
            text_model: std::env::var("MAISON_AI_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string()),
            image_model: std::env::var("MAISON_AI_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
        })
    }

    /// Build a gateway from this configuration.
    ///
    /// Primary and fallback share one connection pool.
    pub fn build_gateway(&self, ledger: Arc<OperationLedger>) -> Gateway {
        let client = reqwest::Client::new();
        let primary = Arc::new(HttpBackend::with_client(
            client.clone(),
            "primary",
            self.base_url.clone(),
            self.primary_api_key.clone(),
        ));
        let fallback = self.fallback_api_key.as_ref().map(|key| {
            Arc::new(HttpBackend::with_client(
                client,
                "fallback",
                self.base_url.clone(),
                key.clone(),
            )) as Arc<dyn crate::backend::GenerativeBackend>
        });
        Gateway::new(primary, fallback, ledger)
    }
}
