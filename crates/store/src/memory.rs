//! In-memory store implementations.
//!
//! Back the orchestrator's tests and dry runs. Semantics mirror the
//! production document store: upsert keyed by slug, style room-profile
//! updates implemented as pure appends.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use maison_core::content::RoomProfile;
use maison_core::types::EntityId;

use crate::entities::{
    Approach, Category, Color, ExecutionStatus, Material, MaterialCategory, MaterialType,
    RoomType, SeedExecution, Style, SubCategory,
};
use crate::traits::{CatalogStore, ExecutionStore, ObjectStorage, StoreError, StyleStore};

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    categories: Vec<Category>,
    sub_categories: Vec<SubCategory>,
    approaches: Vec<Approach>,
    colors: Vec<Color>,
    room_types: Vec<RoomType>,
    materials: Vec<Material>,
    material_categories: Vec<MaterialCategory>,
    material_types: Vec<MaterialType>,
    styles: HashMap<EntityId, Style>,
    executions: HashMap<EntityId, SeedExecution>,
}

/// In-memory document store implementing every store trait.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load catalog fixtures (test and dry-run setup).
    pub fn with_catalog(
        self,
        categories: Vec<Category>,
        sub_categories: Vec<SubCategory>,
        approaches: Vec<Approach>,
        colors: Vec<Color>,
        room_types: Vec<RoomType>,
    ) -> Self {
        {
            let mut inner = self.inner.lock().expect("store lock poisoned");
            inner.categories = categories;
            inner.sub_categories = sub_categories;
            inner.approaches = approaches;
            inner.colors = colors;
            inner.room_types = room_types;
        }
        self
    }

    /// Pre-load material fixtures.
    pub fn with_materials(
        self,
        materials: Vec<Material>,
        categories: Vec<MaterialCategory>,
        types: Vec<MaterialType>,
    ) -> Self {
        {
            let mut inner = self.inner.lock().expect("store lock poisoned");
            inner.materials = materials;
            inner.material_categories = categories;
            inner.material_types = types;
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }

    /// Number of styles currently persisted.
    pub fn style_count(&self) -> usize {
        self.lock().styles.len()
    }

    /// All persisted styles, for test assertions.
    pub fn styles(&self) -> Vec<Style> {
        self.lock().styles.values().cloned().collect()
    }
}

fn upsert_by_slug<T, FSlug, FId>(items: &mut Vec<T>, item: T, slug_of: FSlug, id_of: FId) -> T
where
    T: Clone,
    FSlug: Fn(&T) -> &str,
    FId: Fn(&mut T, &T),
{
    if let Some(existing) = items
        .iter_mut()
        .find(|existing| slug_of(existing) == slug_of(&item))
    {
        let mut updated = item;
        // Keep the original id stable across upserts.
        id_of(&mut updated, existing);
        *existing = updated.clone();
        updated
    } else {
        items.push(item.clone());
        item
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.lock().categories.clone())
    }

    async fn list_sub_categories(&self) -> Result<Vec<SubCategory>, StoreError> {
        Ok(self.lock().sub_categories.clone())
    }

    async fn list_approaches(&self) -> Result<Vec<Approach>, StoreError> {
        Ok(self.lock().approaches.clone())
    }

    async fn list_colors(&self) -> Result<Vec<Color>, StoreError> {
        Ok(self.lock().colors.clone())
    }

    async fn list_room_types(&self) -> Result<Vec<RoomType>, StoreError> {
        Ok(self.lock().room_types.clone())
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StoreError> {
        Ok(self.lock().materials.clone())
    }

    async fn list_material_categories(&self) -> Result<Vec<MaterialCategory>, StoreError> {
        Ok(self.lock().material_categories.clone())
    }

    async fn list_material_types(&self) -> Result<Vec<MaterialType>, StoreError> {
        Ok(self.lock().material_types.clone())
    }

    async fn upsert_category(&self, category: Category) -> Result<Category, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.categories,
            category,
            |c| &c.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_sub_category(&self, sub: SubCategory) -> Result<SubCategory, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.sub_categories,
            sub,
            |s| &s.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_approach(&self, approach: Approach) -> Result<Approach, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.approaches,
            approach,
            |a| &a.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_color(&self, color: Color) -> Result<Color, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.colors,
            color,
            |c| &c.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_room_type(&self, room_type: RoomType) -> Result<RoomType, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.room_types,
            room_type,
            |r| &r.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_material_category(
        &self,
        category: MaterialCategory,
    ) -> Result<MaterialCategory, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.material_categories,
            category,
            |c| &c.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn upsert_material_type(
        &self,
        material_type: MaterialType,
    ) -> Result<MaterialType, StoreError> {
        let mut inner = self.lock();
        Ok(upsert_by_slug(
            &mut inner.material_types,
            material_type,
            |t| &t.slug,
            |updated, existing| updated.id = existing.id.clone(),
        ))
    }

    async fn insert_material(&self, material: Material) -> Result<Material, StoreError> {
        let mut inner = self.lock();
        inner.materials.push(material.clone());
        Ok(material)
    }
}

#[async_trait]
impl StyleStore for InMemoryStore {
    async fn covered_sub_category_ids(&self) -> Result<Vec<EntityId>, StoreError> {
        Ok(self
            .lock()
            .styles
            .values()
            .map(|s| s.sub_category_id.clone())
            .collect())
    }

    async fn insert_style(&self, style: Style) -> Result<Style, StoreError> {
        let mut inner = self.lock();
        inner.styles.insert(style.id.clone(), style.clone());
        Ok(style)
    }

    async fn find_style(&self, id: &str) -> Result<Option<Style>, StoreError> {
        Ok(self.lock().styles.get(id).cloned())
    }

    async fn append_room_profile(
        &self,
        style_id: &str,
        profile: RoomProfile,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let style = inner.styles.get_mut(style_id).ok_or(StoreError::NotFound {
            entity: "style",
            id: style_id.to_string(),
        })?;
        style.room_profiles.push(profile);
        Ok(())
    }

    async fn mark_complete(&self, style_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let style = inner.styles.get_mut(style_id).ok_or(StoreError::NotFound {
            entity: "style",
            id: style_id.to_string(),
        })?;
        style.metadata.is_complete = true;
        style.metadata.generated_at = Some(chrono::Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ExecutionStore for InMemoryStore {
    async fn find_execution(&self, id: &str) -> Result<Option<SeedExecution>, StoreError> {
        Ok(self.lock().executions.get(id).cloned())
    }

    async fn upsert_execution(&self, execution: SeedExecution) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.executions.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn record_style(&self, execution_id: &str, style_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let exec = inner
            .executions
            .get_mut(execution_id)
            .ok_or(StoreError::NotFound {
                entity: "seed_execution",
                id: execution_id.to_string(),
            })?;
        exec.generated_style_ids.push(style_id.to_string());
        Ok(())
    }

    async fn set_expected_room_total(
        &self,
        execution_id: &str,
        total: u32,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let exec = inner
            .executions
            .get_mut(execution_id)
            .ok_or(StoreError::NotFound {
                entity: "seed_execution",
                id: execution_id.to_string(),
            })?;
        // First write wins; the snapshot is frozen for the run.
        if exec.expected_room_total.is_none() {
            exec.expected_room_total = Some(total);
        } else {
            tracing::debug!(
                execution_id,
                rejected = total,
                frozen = ?exec.expected_room_total,
                "expected_room_total already frozen; keeping first value",
            );
        }
        Ok(())
    }

    async fn set_status(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let exec = inner
            .executions
            .get_mut(execution_id)
            .ok_or(StoreError::NotFound {
                entity: "seed_execution",
                id: execution_id.to_string(),
            })?;
        exec.status = status;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// In-memory object storage returning deterministic public URLs.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    uploads: Mutex<Vec<String>>,
    fail_uploads: bool,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose every upload fails, for fallback-path tests.
    pub fn failing() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_uploads: true,
        }
    }

    /// Keys uploaded so far, for test assertions.
    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().expect("uploads lock poisoned").clone()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _mime_type: &str,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> Result<String, StoreError> {
        if self.fail_uploads {
            return Err(StoreError::Backend("upload rejected".to_string()));
        }
        let key = format!("{entity_type}/{entity_id}/{filename}");
        self.uploads
            .lock()
            .expect("uploads lock poisoned")
            .push(key.clone());
        Ok(format!("https://storage.example.com/{key}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use maison_core::types::BilingualText;

    fn approach(slug: &str) -> Approach {
        Approach {
            id: crate::entities::new_entity_id(),
            slug: slug.to_string(),
            name: BilingualText::new(slug, slug),
            description: BilingualText::default(),
        }
    }

    fn style(id: &str, sub: &str) -> Style {
        Style {
            id: id.into(),
            sub_category_id: sub.into(),
            approach_id: "app".into(),
            color_id: "col".into(),
            content: Default::default(),
            gallery: Vec::new(),
            room_profiles: Vec::new(),
            material_ids: Vec::new(),
            price_level: Default::default(),
            metadata: Default::default(),
        }
    }

    fn profile(room: &str) -> RoomProfile {
        RoomProfile {
            room_type_id: room.into(),
            guidance: BilingualText::default(),
            lighting: BilingualText::default(),
            layout: BilingualText::default(),
            material_names: Vec::new(),
            image_urls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_id_stable_by_slug() {
        let store = InMemoryStore::new();
        let first = store.upsert_approach(approach("timeless")).await.unwrap();
        let second = store.upsert_approach(approach("timeless")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_approaches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_inserts_new_slug() {
        let store = InMemoryStore::new();
        store.upsert_approach(approach("timeless")).await.unwrap();
        store.upsert_approach(approach("maximal")).await.unwrap();
        assert_eq!(store.list_approaches().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn covered_ids_reflect_inserted_styles() {
        let store = InMemoryStore::new();
        store.insert_style(style("s1", "sub-a")).await.unwrap();
        let covered = store.covered_sub_category_ids().await.unwrap();
        assert_eq!(covered, vec!["sub-a".to_string()]);
    }

    #[tokio::test]
    async fn room_profiles_append_in_order() {
        let store = InMemoryStore::new();
        store.insert_style(style("s1", "sub-a")).await.unwrap();
        store.append_room_profile("s1", profile("living")).await.unwrap();
        store.append_room_profile("s1", profile("bedroom")).await.unwrap();

        let style = store.find_style("s1").await.unwrap().unwrap();
        assert_eq!(style.room_profiles.len(), 2);
        assert_eq!(style.room_profiles[0].room_type_id, "living");
        assert_eq!(style.room_profiles[1].room_type_id, "bedroom");
    }

    #[tokio::test]
    async fn append_to_missing_style_fails() {
        let store = InMemoryStore::new();
        let err = store
            .append_room_profile("ghost", profile("living"))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "style", .. });
    }

    #[tokio::test]
    async fn mark_complete_sets_metadata() {
        let store = InMemoryStore::new();
        store.insert_style(style("s1", "sub-a")).await.unwrap();
        store.mark_complete("s1").await.unwrap();
        let style = store.find_style("s1").await.unwrap().unwrap();
        assert!(style.metadata.is_complete);
        assert!(style.metadata.generated_at.is_some());
    }

    #[tokio::test]
    async fn expected_room_total_first_write_wins() {
        let store = InMemoryStore::new();
        store
            .upsert_execution(SeedExecution::new("run-1"))
            .await
            .unwrap();
        store.set_expected_room_total("run-1", 4).await.unwrap();
        store.set_expected_room_total("run-1", 9).await.unwrap();
        let exec = store.find_execution("run-1").await.unwrap().unwrap();
        assert_eq!(exec.expected_room_total, Some(4));
    }

    #[tokio::test]
    async fn object_storage_returns_https_urls() {
        let storage = InMemoryObjectStorage::new();
        let url = storage
            .upload(vec![1, 2, 3], "image/webp", "style", "s1", "gallery-0.webp")
            .await
            .unwrap();
        assert!(url.starts_with("https://"));
        assert_eq!(storage.uploaded_keys().len(), 1);
    }
}
