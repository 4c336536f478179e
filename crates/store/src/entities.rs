//! Persisted entity shapes for the catalog and the style aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maison_core::content::{PriceLevel, RoomProfile, SceneImage, StyleContent};
use maison_core::types::{BilingualText, EntityId};

/// Generate a fresh entity id.
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Catalog entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
    pub description: BilingualText,
}

/// A design-style grouping; the unit of style generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: EntityId,
    pub slug: String,
    pub category_id: EntityId,
    pub name: BilingualText,
    pub description: BilingualText,
}

/// A design philosophy applied atop a sub-category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approach {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
    pub description: BilingualText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Color {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
    pub hex: String,
    /// Palette grouping, e.g. `"neutral"`, `"warm"`, `"cool"`.
    pub group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCategory {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialType {
    pub id: EntityId,
    pub slug: String,
    pub name: BilingualText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: EntityId,
    pub name: BilingualText,
    pub category_id: EntityId,
    pub type_id: EntityId,
    pub description: BilingualText,
}

// ---------------------------------------------------------------------------
// Style aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleMetadata {
    /// Flips to true only after the last room profile succeeds.
    pub is_complete: bool,
    pub generated_at: Option<DateTime<Utc>>,
}

/// The persisted aggregate combining a sub-category, an approach, and a
/// color with generated bilingual content and imagery.
///
/// `room_profiles` is append-only during a generation attempt: entries
/// are only ever pushed, never overwritten, so a crash leaves a
/// well-defined resume point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub id: EntityId,
    pub sub_category_id: EntityId,
    pub approach_id: EntityId,
    pub color_id: EntityId,
    pub content: StyleContent,
    pub gallery: Vec<SceneImage>,
    pub room_profiles: Vec<RoomProfile>,
    pub material_ids: Vec<EntityId>,
    pub price_level: PriceLevel,
    pub metadata: StyleMetadata,
}

// ---------------------------------------------------------------------------
// Seed execution record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

/// Tracks one seed run so an interrupted style can be recovered.
///
/// `expected_room_total` is snapshotted when the run starts generating
/// styles; the resume index is always computed against this frozen
/// total, so changing room-type filters between runs of the same
/// execution cannot skew it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedExecution {
    pub id: EntityId,
    pub status: ExecutionStatus,
    pub generated_style_ids: Vec<EntityId>,
    pub expected_room_total: Option<u32>,
}

impl SeedExecution {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            status: ExecutionStatus::Running,
            generated_style_ids: Vec::new(),
            expected_room_total: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_ids_are_unique() {
        assert_ne!(new_entity_id(), new_entity_id());
    }

    #[test]
    fn execution_starts_running_with_no_snapshot() {
        let exec = SeedExecution::new("run-1");
        assert_eq!(exec.status, ExecutionStatus::Running);
        assert!(exec.generated_style_ids.is_empty());
        assert!(exec.expected_room_total.is_none());
    }

    #[test]
    fn style_serde_round_trip() {
        let style = Style {
            id: "style-1".into(),
            sub_category_id: "sub-1".into(),
            approach_id: "app-1".into(),
            color_id: "col-1".into(),
            content: StyleContent::default(),
            gallery: vec![SceneImage {
                url: "https://cdn.example/1.webp".into(),
                scene_tag: "living-hero".into(),
            }],
            room_profiles: Vec::new(),
            material_ids: vec!["mat-1".into()],
            price_level: PriceLevel::Luxury,
            metadata: StyleMetadata::default(),
        };
        let json = serde_json::to_string(&style).unwrap();
        let back: Style = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gallery.len(), 1);
        assert!(!back.metadata.is_complete);
    }
}
