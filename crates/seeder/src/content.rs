//! Structured bilingual content generation.
//!
//! Style content is produced in two phases at different temperatures:
//! a low-temperature factual pass whose material names and palette feed
//! the matcher and the image prompts, then a high-temperature poetic
//! pass. The poetic pass is best-effort; its failure never fails the
//! style.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use maison_ai::{Gateway, GenerateOptions};
use maison_core::content::{PriceLevel, RoomProfile, StyleContent};
use maison_core::pace::Pacer;
use maison_core::types::BilingualText;
use maison_store::{Approach, Color, RoomType, SubCategory};

use crate::error::SeedError;
use crate::prompts;

/// Temperature for the factual pass.
const FACTUAL_TEMPERATURE: f32 = 0.3;

/// Temperature for the poetic pass.
const POETIC_TEMPERATURE: f32 = 0.95;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FactualStyleContent {
    title: BilingualText,
    description: BilingualText,
    characteristics: Vec<BilingualText>,
    material_names: Vec<String>,
    color_palette: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PoeticNarrative {
    narrative: BilingualText,
}

#[derive(Debug, Deserialize)]
struct RoomProfileContent {
    guidance: BilingualText,
    lighting: BilingualText,
    layout: BilingualText,
    material_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EntityDescription {
    description: BilingualText,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct ContentGenerator {
    gateway: Arc<Gateway>,
    pacer: Arc<Pacer>,
    base: GenerateOptions,
}

impl ContentGenerator {
    /// `base` carries the text model and retry tuning; temperature is
    /// overridden per phase.
    pub fn new(gateway: Arc<Gateway>, pacer: Arc<Pacer>, base: GenerateOptions) -> Self {
        Self {
            gateway,
            pacer,
            base,
        }
    }

    fn options(&self, temperature: f32) -> GenerateOptions {
        GenerateOptions {
            temperature,
            ..self.base.clone()
        }
    }

    /// Two-phase style content generation.
    pub async fn style_content(
        &self,
        sub: &SubCategory,
        approach: &Approach,
        color: &Color,
        price_level: PriceLevel,
    ) -> Result<StyleContent, SeedError> {
        self.pacer.pause().await;
        let factual = self
            .gateway
            .generate_structured::<FactualStyleContent>(
                "style_content_factual",
                &prompts::style_factual_prompt(sub, approach, color, price_level),
                prompts::style_factual_schema(),
                &self.options(FACTUAL_TEMPERATURE),
            )
            .await?;

        self.pacer.pause().await;
        let poetic = match self
            .gateway
            .generate_structured::<PoeticNarrative>(
                "style_content_poetic",
                &prompts::style_poetic_prompt(sub, approach, color),
                prompts::style_poetic_schema(),
                &self.options(POETIC_TEMPERATURE),
            )
            .await
        {
            Ok(out) => Some(out.value.narrative),
            Err(e) => {
                tracing::warn!(
                    sub_category = %sub.slug,
                    error = %e,
                    "Poetic pass failed; keeping factual content only",
                );
                None
            }
        };

        let factual = factual.value;
        Ok(StyleContent {
            title: factual.title,
            description: factual.description,
            characteristics: factual.characteristics,
            material_names: factual.material_names,
            color_palette: factual.color_palette,
            poetic,
        })
    }

    /// Generate one room profile. Image URLs start empty; the image
    /// generator fills them in afterwards.
    pub async fn room_profile(
        &self,
        style_title: &BilingualText,
        room: &RoomType,
        price_level: PriceLevel,
    ) -> Result<RoomProfile, SeedError> {
        self.pacer.pause().await;
        let out = self
            .gateway
            .generate_structured::<RoomProfileContent>(
                "room_profile",
                &prompts::room_profile_prompt(&style_title.en, &style_title.ar, room, price_level),
                prompts::room_profile_schema(),
                &self.options(FACTUAL_TEMPERATURE),
            )
            .await?;
        let content = out.value;
        Ok(RoomProfile {
            room_type_id: room.id.clone(),
            guidance: content.guidance,
            lighting: content.lighting,
            layout: content.layout,
            material_names: content.material_names,
            image_urls: Vec::new(),
        })
    }

    /// Short catalog description for a base entity.
    pub async fn entity_description(
        &self,
        kind: &str,
        name: &BilingualText,
    ) -> Result<BilingualText, SeedError> {
        self.pacer.pause().await;
        let out = self
            .gateway
            .generate_structured::<EntityDescription>(
                "entity_description",
                &prompts::entity_description_prompt(kind, &name.en, &name.ar),
                prompts::entity_description_schema(),
                &self.options(0.6),
            )
            .await?;
        Ok(out.value.description)
    }
}

// ---------------------------------------------------------------------------
// Batch helper
// ---------------------------------------------------------------------------

/// Run `op` over `items` in chunks, all-settled within each chunk.
///
/// Items inside one chunk run concurrently; chunks run back-to-back
/// with a pause between them. Every item yields its own `Result`, so a
/// failing item never cancels its chunk-mates, and results come back in
/// input order.
pub async fn process_in_chunks<T, R, F, Fut>(
    items: Vec<T>,
    chunk_size: usize,
    chunk_interval: Duration,
    op: F,
) -> Vec<Result<R, SeedError>>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Result<R, SeedError>>,
{
    let chunk_size = chunk_size.max(1);
    let mut out = Vec::with_capacity(items.len());
    let mut remaining = items;
    let mut first = true;

    while !remaining.is_empty() {
        if !first && !chunk_interval.is_zero() {
            tokio::time::sleep(chunk_interval).await;
        }
        first = false;

        let tail = remaining.split_off(chunk_size.min(remaining.len()));
        let chunk = std::mem::replace(&mut remaining, tail);
        let results = futures::future::join_all(chunk.into_iter().map(&op)).await;
        out.extend(results);
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
