//! Trait contracts for the document store and object storage.
//!
//! The pipeline never issues raw queries; everything it needs from the
//! document store is expressed here as find-by-slug/id, upsert-by-slug,
//! and atomic array-append operations.

use async_trait::async_trait;

use maison_core::content::RoomProfile;
use maison_core::types::EntityId;

use crate::entities::{
    Approach, Category, Color, ExecutionStatus, Material, MaterialCategory, MaterialType,
    RoomType, SeedExecution, Style, SubCategory,
};

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Store backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Read/upsert access to the catalog entities.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn list_sub_categories(&self) -> Result<Vec<SubCategory>, StoreError>;
    async fn list_approaches(&self) -> Result<Vec<Approach>, StoreError>;
    async fn list_colors(&self) -> Result<Vec<Color>, StoreError>;
    async fn list_room_types(&self) -> Result<Vec<RoomType>, StoreError>;
    async fn list_materials(&self) -> Result<Vec<Material>, StoreError>;
    async fn list_material_categories(&self) -> Result<Vec<MaterialCategory>, StoreError>;
    async fn list_material_types(&self) -> Result<Vec<MaterialType>, StoreError>;

    async fn upsert_category(&self, category: Category) -> Result<Category, StoreError>;
    async fn upsert_sub_category(&self, sub: SubCategory) -> Result<SubCategory, StoreError>;
    async fn upsert_approach(&self, approach: Approach) -> Result<Approach, StoreError>;
    async fn upsert_color(&self, color: Color) -> Result<Color, StoreError>;
    async fn upsert_room_type(&self, room_type: RoomType) -> Result<RoomType, StoreError>;
    async fn upsert_material_category(
        &self,
        category: MaterialCategory,
    ) -> Result<MaterialCategory, StoreError>;
    async fn upsert_material_type(
        &self,
        material_type: MaterialType,
    ) -> Result<MaterialType, StoreError>;

    /// Insert a newly specified material, returning it with its id.
    async fn insert_material(&self, material: Material) -> Result<Material, StoreError>;
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

/// Access to the style aggregate.
#[async_trait]
pub trait StyleStore: Send + Sync {
    /// Sub-category ids that already own a style. The orchestrator
    /// filters its work queue against this before any generation work.
    async fn covered_sub_category_ids(&self) -> Result<Vec<EntityId>, StoreError>;

    async fn insert_style(&self, style: Style) -> Result<Style, StoreError>;

    async fn find_style(&self, id: &str) -> Result<Option<Style>, StoreError>;

    /// Atomic append of one room profile to the aggregate's array.
    /// Never issued concurrently for the same style.
    async fn append_room_profile(
        &self,
        style_id: &str,
        profile: RoomProfile,
    ) -> Result<(), StoreError>;

    async fn mark_complete(&self, style_id: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Seed executions
// ---------------------------------------------------------------------------

/// Access to seed execution tracking records.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn find_execution(&self, id: &str) -> Result<Option<SeedExecution>, StoreError>;
    async fn upsert_execution(&self, execution: SeedExecution) -> Result<(), StoreError>;
    async fn record_style(&self, execution_id: &str, style_id: &str) -> Result<(), StoreError>;
    async fn set_expected_room_total(&self, execution_id: &str, total: u32)
        -> Result<(), StoreError>;
    async fn set_status(&self, execution_id: &str, status: ExecutionStatus)
        -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// Durable object storage for generated images.
///
/// Filename collision avoidance is the caller's responsibility
/// (timestamp + random suffix); implementations must tolerate repeated
/// uploads with distinct filenames.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> Result<String, StoreError>;
}
