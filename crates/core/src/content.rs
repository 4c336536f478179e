//! Generated-content domain types shared by the seeder and the store.

use serde::{Deserialize, Serialize};

use crate::types::{BilingualText, EntityId};

// ---------------------------------------------------------------------------
// Price level
// ---------------------------------------------------------------------------

/// Two-tier quality/cost classification influencing generated content
/// and imagery style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    Regular,
    Luxury,
}

impl PriceLevel {
    /// String representation for store persistence and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceLevel::Regular => "regular",
            PriceLevel::Luxury => "luxury",
        }
    }

    /// Parse from a string, defaulting to `Regular` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "luxury" => PriceLevel::Luxury,
            _ => PriceLevel::Regular,
        }
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        PriceLevel::Regular
    }
}

// ---------------------------------------------------------------------------
// Style content
// ---------------------------------------------------------------------------

/// Bilingual structured content generated for one style.
///
/// The factual fields are generated at low temperature because the
/// material names and characteristics feed the matcher and the image
/// prompts; the optional poetic block is generated separately at high
/// temperature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleContent {
    pub title: BilingualText,
    pub description: BilingualText,
    pub characteristics: Vec<BilingualText>,
    /// Free-text material names to be resolved by the material matcher.
    pub material_names: Vec<String>,
    /// Dominant palette, as display color names.
    pub color_palette: Vec<String>,
    /// High-temperature narrative block, merged in after the factual pass.
    pub poetic: Option<BilingualText>,
}

/// One image in a style's primary gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneImage {
    pub url: String,
    pub scene_tag: String,
}

/// Per-room-type structured guidance plus embedded image URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomProfile {
    pub room_type_id: EntityId,
    pub guidance: BilingualText,
    pub lighting: BilingualText,
    pub layout: BilingualText,
    /// Material names referenced by this room's guidance.
    pub material_names: Vec<String>,
    pub image_urls: Vec<String>,
}

/// Full specification for a material the matcher decided to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: BilingualText,
    pub category_id: EntityId,
    pub type_id: EntityId,
    pub description: BilingualText,
}

// ---------------------------------------------------------------------------
// Golden scenes
// ---------------------------------------------------------------------------

/// The fixed curated set of room/vignette prompts used for a style's
/// primary image gallery. `(scene_tag, prompt fragment)`.
pub const GOLDEN_SCENES: &[(&str, &str)] = &[
    (
        "living-hero",
        "a wide hero shot of a living room, natural afternoon light, styled seating arrangement",
    ),
    (
        "dining-vignette",
        "an intimate dining vignette, table set for four, layered textures",
    ),
    (
        "bedroom-calm",
        "a serene bedroom scene, soft morning light, textile layering on the bed",
    ),
    (
        "kitchen-detail",
        "a close-up of kitchen materials and cabinetry hardware, shallow depth of field",
    ),
    (
        "entry-statement",
        "a statement entryway with a console, mirror, and sculptural lighting",
    ),
    (
        "bathroom-spa",
        "a spa-like bathroom, stone surfaces, warm diffused light",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_level_round_trips() {
        assert_eq!(PriceLevel::from_str("luxury"), PriceLevel::Luxury);
        assert_eq!(PriceLevel::from_str("regular"), PriceLevel::Regular);
        assert_eq!(PriceLevel::Luxury.as_str(), "luxury");
    }

    #[test]
    fn price_level_defaults_unknown_to_regular() {
        assert_eq!(PriceLevel::from_str("premium"), PriceLevel::Regular);
    }

    #[test]
    fn golden_scenes_have_unique_tags() {
        let mut tags: Vec<&str> = GOLDEN_SCENES.iter().map(|(tag, _)| *tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), GOLDEN_SCENES.len());
    }

    #[test]
    fn style_content_serde_round_trip() {
        let content = StyleContent {
            title: crate::types::BilingualText::new("Art Deco", "آرت ديكو"),
            material_names: vec!["brass".into(), "velvet".into()],
            ..Default::default()
        };
        let json = serde_json::to_string(&content).unwrap();
        let back: StyleContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title.en, "Art Deco");
        assert_eq!(back.material_names.len(), 2);
    }
}
