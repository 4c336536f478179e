//! Prompt templates and response schemas, one set per entity kind.
//!
//! Every template embeds bilingual (English/Arabic) context so one call
//! yields both locales. Schemas use the provider's structured-output
//! dialect and are enforced again at the gateway boundary by the typed
//! response structs in [`crate::content`].

use maison_core::content::PriceLevel;
use maison_store::{Approach, Color, Material, MaterialCategory, MaterialType, RoomType, SubCategory};

fn bilingual_field(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "en": { "type": "STRING", "description": format!("{description} (English)") },
            "ar": { "type": "STRING", "description": format!("{description} (Arabic)") },
        },
        "required": ["en", "ar"],
    })
}

// ---------------------------------------------------------------------------
// Style content (two-phase)
// ---------------------------------------------------------------------------

/// Factual phase: low temperature, feeds material matching and image
/// prompts.
pub fn style_factual_prompt(
    sub: &SubCategory,
    approach: &Approach,
    color: &Color,
    price_level: PriceLevel,
) -> String {
    format!(
        "You are an interior design editor producing catalog content in English and Arabic.\n\
         Design style: {} ({}).\n\
         Design approach: {} ({}).\n\
         Dominant color: {} ({}), hex {}.\n\
         Price tier: {}.\n\
         Produce factual structured content: a title, a concise description, \
         4-6 defining characteristics, a list of 5-8 real interior materials that define \
         this style (plain material names, English), and a palette of 3-5 color names. \
         Keep material names generic and catalog-friendly (e.g. \"Marble\", \"Brushed brass\").",
        sub.name.en, sub.name.ar, approach.name.en, approach.name.ar, color.name.en,
        color.name.ar, color.hex, price_level.as_str(),
    )
}

pub fn style_factual_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": bilingual_field("style title"),
            "description": bilingual_field("style description"),
            "characteristics": { "type": "ARRAY", "items": bilingual_field("one characteristic") },
            "material_names": { "type": "ARRAY", "items": { "type": "STRING" } },
            "color_palette": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["title", "description", "characteristics", "material_names", "color_palette"],
    })
}

/// Poetic phase: high temperature, prose quality over precision.
pub fn style_poetic_prompt(sub: &SubCategory, approach: &Approach, color: &Color) -> String {
    format!(
        "Write a short, evocative narrative (3-4 sentences, in both English and Arabic) \
         capturing the mood of a {} interior seen through a {} lens, bathed in {} tones. \
         Avoid lists and technical vocabulary; write atmosphere.",
        sub.name.en, approach.name.en, color.name.en,
    )
}

pub fn style_poetic_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": { "narrative": bilingual_field("poetic narrative") },
        "required": ["narrative"],
    })
}

// ---------------------------------------------------------------------------
// Room profiles
// ---------------------------------------------------------------------------

pub fn room_profile_prompt(
    style_title_en: &str,
    style_title_ar: &str,
    room: &RoomType,
    price_level: PriceLevel,
) -> String {
    format!(
        "For the interior style \"{}\" (\"{}\"), produce per-room guidance for the room type \
         \"{}\" (\"{}\"), price tier {}. Return bilingual guidance on how to realize the style \
         in this room, lighting advice, layout advice, and 3-5 material names suited to the room.",
        style_title_en,
        style_title_ar,
        room.name.en,
        room.name.ar,
        price_level.as_str(),
    )
}

pub fn room_profile_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "guidance": bilingual_field("room guidance"),
            "lighting": bilingual_field("lighting advice"),
            "layout": bilingual_field("layout advice"),
            "material_names": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["guidance", "lighting", "layout", "material_names"],
    })
}

// ---------------------------------------------------------------------------
// Entity descriptions (catalog seeding)
// ---------------------------------------------------------------------------

pub fn entity_description_prompt(kind: &str, name_en: &str, name_ar: &str) -> String {
    format!(
        "Write a 1-2 sentence bilingual catalog description for the interior-design {kind} \
         named \"{name_en}\" (\"{name_ar}\")."
    )
}

pub fn entity_description_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": { "description": bilingual_field("catalog description") },
        "required": ["description"],
    })
}

// ---------------------------------------------------------------------------
// Style selection
// ---------------------------------------------------------------------------

pub fn selection_prompt(sub: &SubCategory, approaches: &[Approach], colors: &[Color]) -> String {
    let mut prompt = format!(
        "Choose the best-fit design approach and color for the interior style \
         \"{}\" (\"{}\"): {}\n\nCandidate approaches:\n",
        sub.name.en, sub.name.ar, sub.description.en,
    );
    for a in approaches {
        prompt.push_str(&format!("- id={} | {} ({}) — {}\n", a.id, a.name.en, a.name.ar, a.description.en));
    }
    prompt.push_str("\nCandidate colors:\n");
    for c in colors {
        prompt.push_str(&format!("- id={} | {} ({}) — {} group, hex {}\n", c.id, c.name.en, c.name.ar, c.group, c.hex));
    }
    prompt.push_str(
        "\nReturn the chosen approach_id and color_id (exactly as listed), a confidence in \
         [0,1], and a short bilingual reasoning.",
    );
    prompt
}

pub fn selection_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "approach_id": { "type": "STRING" },
            "color_id": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "reasoning": bilingual_field("selection reasoning"),
        },
        "required": ["approach_id", "color_id", "confidence", "reasoning"],
    })
}

// ---------------------------------------------------------------------------
// Material matching
// ---------------------------------------------------------------------------

pub fn material_match_prompt(
    names: &[String],
    candidates: &[Material],
    categories: &[MaterialCategory],
    types: &[MaterialType],
) -> String {
    let mut prompt = String::from(
        "Match each input material name to an existing catalog material, or specify a new \
         one.\n\nInput names:\n",
    );
    for name in names {
        prompt.push_str(&format!("- {name}\n"));
    }
    prompt.push_str("\nExisting materials (link targets):\n");
    for m in candidates {
        prompt.push_str(&format!("- id={} | {} ({})\n", m.id, m.name.en, m.name.ar));
    }
    prompt.push_str("\nMaterial categories (for new materials):\n");
    for c in categories {
        prompt.push_str(&format!("- id={} | {}\n", c.id, c.name.en));
    }
    prompt.push_str("\nMaterial types (for new materials):\n");
    for t in types {
        prompt.push_str(&format!("- id={} | {}\n", t.id, t.name.en));
    }
    prompt.push_str(
        "\nFor every input name return action \"link\" with matched_material_id taken from \
         the existing list, or action \"create\" with a complete new_material whose \
         category_id and type_id come from the lists above. Include a confidence in [0,1] \
         and a short reasoning.",
    );
    prompt
}

pub fn material_match_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "results": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "input_name": { "type": "STRING" },
                        "action": { "type": "STRING", "enum": ["link", "create"] },
                        "matched_material_id": { "type": "STRING" },
                        "confidence": { "type": "NUMBER" },
                        "new_material": {
                            "type": "OBJECT",
                            "properties": {
                                "name": bilingual_field("material name"),
                                "category_id": { "type": "STRING" },
                                "type_id": { "type": "STRING" },
                                "description": bilingual_field("material description"),
                            },
                            "required": ["name", "category_id", "type_id"],
                        },
                        "reasoning": { "type": "STRING" },
                    },
                    "required": ["input_name", "action", "confidence"],
                },
            },
        },
        "required": ["results"],
    })
}

// ---------------------------------------------------------------------------
// Scene images
// ---------------------------------------------------------------------------

pub fn scene_image_prompt(
    style_title_en: &str,
    scene_fragment: &str,
    palette: &[String],
    price_level: PriceLevel,
) -> String {
    let tier = match price_level {
        PriceLevel::Luxury => "high-end, bespoke finishes",
        PriceLevel::Regular => "accessible, well-crafted finishes",
    };
    format!(
        "Photorealistic interior photograph, {} style, {}. Palette: {}. {}. \
         No people, no text, magazine quality.",
        style_title_en,
        scene_fragment,
        palette.join(", "),
        tier,
    )
}
