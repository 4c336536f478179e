//! Provider gateway for generative backends.
//!
//! Wraps one or more generative-AI backends behind a uniform call
//! contract with retry, fallback, and per-call telemetry. Callers get
//! typed structured output; untyped JSON never flows past the gateway
//! boundary.

pub mod backend;
pub mod config;
pub mod gateway;
pub mod http;
pub mod telemetry;

pub use backend::{
    BackendError, GenerationRequest, GenerativeBackend, ImageRequest, InlineImage, JsonResponse,
    TextResponse,
};
pub use config::{ConfigError, ProviderConfig};
pub use gateway::{Gateway, GatewayError, GenerateOptions, Structured, TextOutput};
pub use telemetry::{MetricsSnapshot, OperationLedger, OperationRecord};
