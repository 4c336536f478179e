//! Approach/color selection for a sub-category.
//!
//! The AI picks the best-fit approach and color from the catalog
//! candidates. An answer referencing unknown ids, or a failed call,
//! degrades to a deterministic neutral pick so style generation never
//! stalls on selection.

use std::sync::Arc;

use serde::Deserialize;

use maison_ai::{Gateway, GenerateOptions};
use maison_core::types::{BilingualText, EntityId};
use maison_store::{Approach, Color, SubCategory};

use crate::error::SeedError;
use crate::prompts;

/// Confidence reported for the deterministic fallback pick.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct AiSelection {
    approach_id: String,
    color_id: String,
    confidence: f64,
    #[serde(default)]
    reasoning: Option<BilingualText>,
}

/// The selected pairing for one style.
#[derive(Debug, Clone)]
pub struct StyleSelection {
    pub approach_id: EntityId,
    pub color_id: EntityId,
    pub confidence: f64,
    pub reasoning: Option<BilingualText>,
}

pub struct StyleSelector {
    gateway: Arc<Gateway>,
    base: GenerateOptions,
}

impl StyleSelector {
    pub fn new(gateway: Arc<Gateway>, base: GenerateOptions) -> Self {
        Self { gateway, base }
    }

    /// Pick an approach and a color for the sub-category.
    ///
    /// Errors only on empty candidate lists; AI trouble falls back.
    pub async fn select(
        &self,
        sub: &SubCategory,
        approaches: &[Approach],
        colors: &[Color],
    ) -> Result<StyleSelection, SeedError> {
        if approaches.is_empty() || colors.is_empty() {
            return Err(SeedError::Input(format!(
                "cannot select for {}: no approaches or colors in catalog",
                sub.slug
            )));
        }

        let response = self
            .gateway
            .generate_structured::<AiSelection>(
                "style_selection",
                &prompts::selection_prompt(sub, approaches, colors),
                prompts::selection_schema(),
                &GenerateOptions {
                    temperature: 0.4,
                    ..self.base.clone()
                },
            )
            .await;

        match response {
            Ok(out) => {
                let picked = out.value;
                let approach_known = approaches.iter().any(|a| a.id == picked.approach_id);
                let color_known = colors.iter().any(|c| c.id == picked.color_id);
                if approach_known && color_known {
                    return Ok(StyleSelection {
                        approach_id: picked.approach_id,
                        color_id: picked.color_id,
                        confidence: picked.confidence.clamp(0.0, 1.0),
                        reasoning: picked.reasoning,
                    });
                }
                tracing::warn!(
                    sub_category = %sub.slug,
                    approach_id = %picked.approach_id,
                    color_id = %picked.color_id,
                    "Selection referenced unknown ids; using neutral fallback",
                );
            }
            Err(e) => {
                tracing::warn!(
                    sub_category = %sub.slug,
                    error = %e,
                    "Selection call failed; using neutral fallback",
                );
            }
        }

        Ok(neutral_fallback(sub, approaches, colors))
    }
}

/// Deterministic selection keyed on the sub-category slug.
///
/// The approach defaults to the catalog's timeless/neutral entry when
/// one exists; only a catalog without such an entry falls back to a
/// stable hash pick. Neutral-group colors are preferred; within each
/// candidate list the pick is stable across runs.
fn neutral_fallback(sub: &SubCategory, approaches: &[Approach], colors: &[Color]) -> StyleSelection {
    let approach = approaches
        .iter()
        .find(|a| {
            let name = a.name.en.to_lowercase();
            a.slug.contains("timeless")
                || a.slug.contains("neutral")
                || name.contains("timeless")
                || name.contains("neutral")
        })
        .unwrap_or_else(|| {
            let mut sorted: Vec<&Approach> = approaches.iter().collect();
            sorted.sort_by(|a, b| a.slug.cmp(&b.slug));
            sorted[stable_index(&sub.slug, sorted.len())]
        });

    let mut neutral: Vec<&Color> = colors.iter().filter(|c| c.group == "neutral").collect();
    if neutral.is_empty() {
        neutral = colors.iter().collect();
    }
    neutral.sort_by(|a, b| a.slug.cmp(&b.slug));
    let color = neutral[stable_index(&sub.slug, neutral.len())];

    StyleSelection {
        approach_id: approach.id.clone(),
        color_id: color.id.clone(),
        confidence: FALLBACK_CONFIDENCE,
        reasoning: None,
    }
}

/// FNV-1a of the key, reduced modulo `len`.
fn stable_index(key: &str, len: usize) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in key.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % len.max(1) as u64) as usize
}
