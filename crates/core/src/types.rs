//! Shared id and text types used across the pipeline.

use serde::{Deserialize, Serialize};

/// Document-store entity id (slug-sized opaque string).
pub type EntityId = String;

/// A text value carried in both supported locales.
///
/// The pipeline generates every user-facing string in English and Arabic
/// in a single pass, so the pair travels together through prompts,
/// matching, and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BilingualText {
    pub en: String,
    pub ar: String,
}

impl BilingualText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// True when both locales are empty.
    pub fn is_empty(&self) -> bool {
        self.en.is_empty() && self.ar.is_empty()
    }
}
