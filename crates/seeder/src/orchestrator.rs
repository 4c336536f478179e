//! The seed run driver.
//!
//! One run walks the catalog in dependency order: base entities first
//! (approaches, colors, room types, material taxonomy, categories and
//! their sub-categories), then one style per uncovered sub-category.
//! Work is deduplicated up front against what the store already holds,
//! interrupted styles from a previous run are resumed before new work
//! starts, and a failure inside one entity's pipeline is collected and
//! never aborts the rest of the run.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use maison_ai::{Gateway, GenerateOptions};
use maison_core::content::PriceLevel;
use maison_core::matching::MatcherConfig;
use maison_core::pace::{Pacer, BATCH_CHUNK_INTERVAL, CONTENT_CALL_INTERVAL, IMAGE_CALL_INTERVAL};
use maison_core::retry::RetryPolicy;
use maison_core::types::BilingualText;
use maison_store::{
    new_entity_id, Approach, CatalogStore, Category, Color, ExecutionStatus, ExecutionStore,
    MaterialCategory, MaterialType, ObjectStorage, RoomType, SeedExecution, Style, StyleMetadata,
    StyleStore, SubCategory,
};

use crate::content::{process_in_chunks, ContentGenerator};
use crate::error::SeedError;
use crate::images::{ImageConfig, ImageGenerator};
use crate::materials::MaterialMatcher;
use crate::seed_data;
use crate::selector::{StyleSelection, StyleSelector};

/// Descriptions are generated in concurrent chunks of this size.
const DESCRIPTION_CHUNK_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Run surface
// ---------------------------------------------------------------------------

/// What kind of entity a failure was collected against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    SubCategory,
    Approach,
    Style,
    RoomProfile,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::SubCategory => "sub_category",
            EntityKind::Approach => "approach",
            EntityKind::Style => "style",
            EntityKind::RoomProfile => "room_profile",
        }
    }

    /// Inverse of [`as_str`](Self::as_str), for env/CLI parsing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(EntityKind::Category),
            "sub_category" => Some(EntityKind::SubCategory),
            "approach" => Some(EntityKind::Approach),
            "style" => Some(EntityKind::Style),
            "room_profile" => Some(EntityKind::RoomProfile),
            _ => None,
        }
    }
}

/// One collected per-entity failure.
#[derive(Debug, Clone)]
pub struct SeedFailure {
    pub kind: EntityKind,
    pub entity: String,
    pub message: String,
}

/// Progress notification passed to the caller's callback.
#[derive(Debug, Clone)]
pub struct SeedProgress {
    pub phase: &'static str,
    pub current: usize,
    pub total: usize,
    pub detail: String,
}

pub type ProgressFn = Arc<dyn Fn(&SeedProgress) + Send + Sync>;

/// Caller-pinned approach and color, bypassing selection entirely.
#[derive(Debug, Clone)]
pub struct ManualSelection {
    pub approach_id: String,
    pub color_id: String,
}

/// Per-run options.
#[derive(Clone)]
pub struct SeedOptions {
    pub execution_id: String,
    pub generate_images: bool,
    /// Images generated per room profile.
    pub images_per_room: usize,
    /// Cap on newly generated styles (resume work is not counted).
    pub style_limit: Option<usize>,
    /// Restrict generation to these entity kinds. Static reference rows
    /// (room types, colors, material taxonomy) are always ensured.
    pub only: Option<Vec<EntityKind>>,
    /// Plan the work queue and return without writing anything.
    pub dry_run: bool,
    /// Only seed styles under these category slugs.
    pub category_filter: Option<Vec<String>>,
    /// Only seed styles for these sub-category slugs.
    pub sub_category_filter: Option<Vec<String>>,
    /// Only generate room profiles for these room-type slugs.
    pub room_type_filter: Option<Vec<String>>,
    /// Pin approach and color instead of selecting per style.
    pub manual_selection: Option<ManualSelection>,
    pub price_level: PriceLevel,
    pub progress: Option<ProgressFn>,
}

impl SeedOptions {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            generate_images: true,
            images_per_room: 2,
            style_limit: None,
            only: None,
            dry_run: false,
            category_filter: None,
            sub_category_filter: None,
            room_type_filter: None,
            manual_selection: None,
            price_level: PriceLevel::Regular,
            progress: None,
        }
    }

    /// Whether this run generates the given entity kind.
    fn wants(&self, kind: EntityKind) -> bool {
        self.only.as_ref().map_or(true, |kinds| kinds.contains(&kind))
    }
}

/// Whether a sub-category falls inside the run's category/sub-category scope.
fn in_scope(options: &SeedOptions, category_slug: &str, sub_slug: &str) -> bool {
    if let Some(categories) = &options.category_filter {
        if !categories.iter().any(|c| c == category_slug) {
            return false;
        }
    }
    if let Some(subs) = &options.sub_category_filter {
        if !subs.iter().any(|s| s == sub_slug) {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedStats {
    /// New styles the work queue held after dedupe, filters, and limit.
    pub styles_planned: usize,
    pub styles_created: usize,
    pub styles_resumed: usize,
    pub styles_skipped: usize,
    pub room_profiles: usize,
    pub materials_linked: usize,
    pub materials_created: usize,
    pub images_generated: usize,
    pub placeholders_used: usize,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct SeedResult {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub stats: SeedStats,
    pub failures: Vec<SeedFailure>,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Orchestrator tuning: models, retry shape, pacing intervals.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Template for every structured-content call (model, retries).
    pub text_options: GenerateOptions,
    pub image_model: String,
    pub matcher: MatcherConfig,
    pub image_retry: RetryPolicy,
    pub content_interval: Duration,
    pub image_interval: Duration,
    pub chunk_interval: Duration,
}

impl OrchestratorConfig {
    pub fn new(text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        Self {
            text_options: GenerateOptions {
                model: text_model.into(),
                ..Default::default()
            },
            image_model: image_model.into(),
            matcher: MatcherConfig::default(),
            image_retry: RetryPolicy::default(),
            content_interval: CONTENT_CALL_INTERVAL,
            image_interval: IMAGE_CALL_INTERVAL,
            chunk_interval: BATCH_CHUNK_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SeedOrchestrator {
    catalog: Arc<dyn CatalogStore>,
    styles: Arc<dyn StyleStore>,
    executions: Arc<dyn ExecutionStore>,
    content: ContentGenerator,
    images: ImageGenerator,
    matcher: MaterialMatcher,
    selector: StyleSelector,
    chunk_interval: Duration,
}

impl SeedOrchestrator {
    pub fn new(
        gateway: Arc<Gateway>,
        catalog: Arc<dyn CatalogStore>,
        styles: Arc<dyn StyleStore>,
        executions: Arc<dyn ExecutionStore>,
        storage: Arc<dyn ObjectStorage>,
        config: OrchestratorConfig,
    ) -> Self {
        let content_pacer = Arc::new(Pacer::new(config.content_interval));
        let image_pacer = Arc::new(Pacer::new(config.image_interval));
        Self {
            content: ContentGenerator::new(
                gateway.clone(),
                content_pacer,
                config.text_options.clone(),
            ),
            images: ImageGenerator::new(
                gateway.clone(),
                storage,
                image_pacer,
                ImageConfig {
                    retry: config.image_retry,
                    ..ImageConfig::new(config.image_model)
                },
            ),
            matcher: MaterialMatcher::new(
                gateway.clone(),
                catalog.clone(),
                config.matcher,
                config.text_options.clone(),
            ),
            selector: StyleSelector::new(gateway, config.text_options),
            catalog,
            styles,
            executions,
            chunk_interval: config.chunk_interval,
        }
    }

    /// Run one seed execution end to end.
    ///
    /// Store failures at the run level are fatal; everything scoped to
    /// a single entity is collected into the result's failure list.
    pub async fn run(&self, options: &SeedOptions) -> Result<SeedResult, SeedError> {
        if options.dry_run {
            return self.plan_run(options).await;
        }

        let mut stats = SeedStats::default();
        let mut failures = Vec::new();

        tracing::info!(execution_id = %options.execution_id, "Seed run starting");
        self.report(options, "base-catalog", 0, 1, "seeding base entities");
        self.ensure_base_catalog(options, &mut failures).await?;

        let approaches = self.catalog.list_approaches().await?;
        let colors = self.catalog.list_colors().await?;
        let categories = self.catalog.list_categories().await?;
        let sub_categories = self.catalog.list_sub_categories().await?;
        let mut room_types = self.catalog.list_room_types().await?;
        if let Some(rooms) = &options.room_type_filter {
            room_types.retain(|r| rooms.iter().any(|s| s == &r.slug));
        }

        // Execution record plus the frozen room-count snapshot. The
        // snapshot is first-write-wins, so a resumed execution keeps the
        // total it started with even if room types changed since.
        let execution = match self.executions.find_execution(&options.execution_id).await? {
            Some(existing) => existing,
            None => {
                let fresh = SeedExecution::new(options.execution_id.clone());
                self.executions.upsert_execution(fresh.clone()).await?;
                fresh
            }
        };
        self.executions
            .set_expected_room_total(&options.execution_id, room_types.len() as u32)
            .await?;
        let expected_room_total = self
            .executions
            .find_execution(&options.execution_id)
            .await?
            .and_then(|e| e.expected_room_total)
            .unwrap_or(room_types.len() as u32) as usize;
        self.executions
            .set_status(&options.execution_id, ExecutionStatus::Running)
            .await?;

        let seed_styles = options.wants(EntityKind::Style);

        // Resume interrupted styles before any new generation.
        if seed_styles {
            for style_id in &execution.generated_style_ids {
                if let Some(style) = self.styles.find_style(style_id).await? {
                    if !style.metadata.is_complete {
                        self.report(options, "resume", 0, 1, style_id.clone());
                        self.resume_style(&style, &room_types, expected_room_total, options, &mut stats, &mut failures)
                            .await?;
                    }
                }
            }
        }

        // Dedupe pre-filter: a sub-category that already owns a style
        // is skipped before any generation call is spent on it.
        let covered: HashSet<String> = self
            .styles
            .covered_sub_category_ids()
            .await?
            .into_iter()
            .collect();
        let category_slugs: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.id.as_str(), c.slug.as_str()))
            .collect();
        let mut pending: Vec<&SubCategory> = sub_categories
            .iter()
            .filter(|s| seed_styles && !covered.contains(&s.id))
            .collect();
        if seed_styles {
            stats.styles_skipped = sub_categories.len() - pending.len();
        }
        pending.retain(|s| {
            let category = category_slugs
                .get(s.category_id.as_str())
                .copied()
                .unwrap_or("");
            in_scope(options, category, &s.slug)
        });
        if let Some(limit) = options.style_limit {
            pending.truncate(limit);
        }
        stats.styles_planned = pending.len();
        tracing::info!(
            pending = pending.len(),
            skipped = stats.styles_skipped,
            "Style work queue built",
        );

        let total = pending.len();
        for (current, sub) in pending.into_iter().enumerate() {
            self.report(options, "styles", current + 1, total, sub.slug.clone());
            match self
                .seed_style(
                    sub,
                    &approaches,
                    &colors,
                    &room_types,
                    expected_room_total,
                    options,
                    &mut stats,
                    &mut failures,
                )
                .await
            {
                Ok(()) => stats.styles_created += 1,
                Err(e) => {
                    tracing::error!(sub_category = %sub.slug, error = %e, "Style generation failed");
                    failures.push(SeedFailure {
                        kind: EntityKind::Style,
                        entity: sub.slug.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // Any collected failure fails the run; partial progress is
        // still retained in the store and in the stats.
        let status = if failures.is_empty() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        self.executions
            .set_status(&options.execution_id, status)
            .await?;

        tracing::info!(
            execution_id = %options.execution_id,
            status = status.as_str(),
            styles_created = stats.styles_created,
            styles_resumed = stats.styles_resumed,
            failures = failures.len(),
            "Seed run finished",
        );
        Ok(SeedResult {
            execution_id: options.execution_id.clone(),
            status,
            stats,
            failures,
        })
    }

    /// Preview the style work queue without writing anything.
    ///
    /// Reads only what the store already holds, plus the static seeds a
    /// real run's base-catalog phase would add.
    async fn plan_run(&self, options: &SeedOptions) -> Result<SeedResult, SeedError> {
        if !options.wants(EntityKind::Style) {
            return Ok(SeedResult {
                execution_id: options.execution_id.clone(),
                status: ExecutionStatus::Completed,
                stats: SeedStats::default(),
                failures: Vec::new(),
            });
        }
        let categories = self.catalog.list_categories().await?;
        let sub_categories = self.catalog.list_sub_categories().await?;
        let covered: HashSet<String> = self
            .styles
            .covered_sub_category_ids()
            .await?
            .into_iter()
            .collect();

        let category_slugs: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.id.as_str(), c.slug.as_str()))
            .collect();
        let known: HashSet<&str> = sub_categories.iter().map(|s| s.slug.as_str()).collect();

        let mut planned: Vec<String> = sub_categories
            .iter()
            .filter(|s| !covered.contains(&s.id))
            .filter(|s| {
                let category = category_slugs
                    .get(s.category_id.as_str())
                    .copied()
                    .unwrap_or("");
                in_scope(options, category, &s.slug)
            })
            .map(|s| s.slug.clone())
            .collect();
        for seed in seed_data::CATEGORIES {
            for sub in seed.subs {
                if !known.contains(sub.slug) && in_scope(options, seed.slug, sub.slug) {
                    planned.push(sub.slug.to_string());
                }
            }
        }
        if let Some(limit) = options.style_limit {
            planned.truncate(limit);
        }

        let total = planned.len();
        for (current, slug) in planned.iter().enumerate() {
            self.report(options, "plan", current + 1, total, slug.clone());
        }
        tracing::info!(execution_id = %options.execution_id, planned = total, "Dry run planned");
        Ok(SeedResult {
            execution_id: options.execution_id.clone(),
            status: ExecutionStatus::Completed,
            stats: SeedStats {
                styles_planned: total,
                ..SeedStats::default()
            },
            failures: Vec::new(),
        })
    }

    // -----------------------------------------------------------------
    // Base catalog
    // -----------------------------------------------------------------

    /// Upsert the static catalog entities, generating descriptions only
    /// for entities that do not already carry one. Description trouble
    /// degrades to an empty description and a collected failure.
    ///
    /// Static reference rows (room types, colors, material taxonomy)
    /// are always ensured; the described kinds honor `options.only`.
    async fn ensure_base_catalog(
        &self,
        options: &SeedOptions,
        failures: &mut Vec<SeedFailure>,
    ) -> Result<(), SeedError> {
        for seed in seed_data::ROOM_TYPES {
            self.catalog
                .upsert_room_type(RoomType {
                    id: new_entity_id(),
                    slug: seed.slug.to_string(),
                    name: BilingualText::new(seed.name_en, seed.name_ar),
                })
                .await?;
        }
        for seed in seed_data::COLORS {
            self.catalog
                .upsert_color(Color {
                    id: new_entity_id(),
                    slug: seed.slug.to_string(),
                    name: BilingualText::new(seed.name_en, seed.name_ar),
                    hex: seed.hex.to_string(),
                    group: seed.group.to_string(),
                })
                .await?;
        }
        for seed in seed_data::MATERIAL_CATEGORIES {
            self.catalog
                .upsert_material_category(MaterialCategory {
                    id: new_entity_id(),
                    slug: seed.slug.to_string(),
                    name: BilingualText::new(seed.name_en, seed.name_ar),
                })
                .await?;
        }
        for seed in seed_data::MATERIAL_TYPES {
            self.catalog
                .upsert_material_type(MaterialType {
                    id: new_entity_id(),
                    slug: seed.slug.to_string(),
                    name: BilingualText::new(seed.name_en, seed.name_ar),
                })
                .await?;
        }

        let descriptions = self.generate_descriptions(options, failures).await?;
        let described = |slug: &str| descriptions.get(slug).cloned().unwrap_or_default();

        if options.wants(EntityKind::Approach) {
            for seed in seed_data::APPROACHES {
                self.catalog
                    .upsert_approach(Approach {
                        id: new_entity_id(),
                        slug: seed.slug.to_string(),
                        name: BilingualText::new(seed.name_en, seed.name_ar),
                        description: described(seed.slug),
                    })
                    .await?;
            }
        }
        // Sub-categories need their parent rows, so either kind pulls
        // the categories in.
        if options.wants(EntityKind::Category) || options.wants(EntityKind::SubCategory) {
            for seed in seed_data::CATEGORIES {
                let category = self
                    .catalog
                    .upsert_category(Category {
                        id: new_entity_id(),
                        slug: seed.slug.to_string(),
                        name: BilingualText::new(seed.name_en, seed.name_ar),
                        description: described(seed.slug),
                    })
                    .await?;
                if !options.wants(EntityKind::SubCategory) {
                    continue;
                }
                for sub in seed.subs {
                    self.catalog
                        .upsert_sub_category(SubCategory {
                            id: new_entity_id(),
                            slug: sub.slug.to_string(),
                            category_id: category.id.clone(),
                            name: BilingualText::new(sub.name_en, sub.name_ar),
                            description: described(sub.slug),
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Generate descriptions for every described entity that lacks one,
    /// in concurrent all-settled chunks. Returns slug -> description.
    async fn generate_descriptions(
        &self,
        options: &SeedOptions,
        failures: &mut Vec<SeedFailure>,
    ) -> Result<HashMap<String, BilingualText>, SeedError> {
        struct Task {
            kind: EntityKind,
            kind_label: &'static str,
            slug: String,
            name: BilingualText,
        }

        let mut existing: HashMap<String, BilingualText> = HashMap::new();
        for approach in self.catalog.list_approaches().await? {
            existing.insert(approach.slug, approach.description);
        }
        for category in self.catalog.list_categories().await? {
            existing.insert(category.slug, category.description);
        }
        for sub in self.catalog.list_sub_categories().await? {
            existing.insert(sub.slug, sub.description);
        }

        let mut tasks = Vec::new();
        let mut push_task = |kind, kind_label, slug: &str, en: &str, ar: &str| {
            if !options.wants(kind) {
                return;
            }
            if existing.get(slug).is_some_and(|d| !d.is_empty()) {
                return;
            }
            tasks.push(Task {
                kind,
                kind_label,
                slug: slug.to_string(),
                name: BilingualText::new(en, ar),
            });
        };
        for seed in seed_data::APPROACHES {
            push_task(EntityKind::Approach, "design approach", seed.slug, seed.name_en, seed.name_ar);
        }
        for seed in seed_data::CATEGORIES {
            push_task(EntityKind::Category, "style category", seed.slug, seed.name_en, seed.name_ar);
            for sub in seed.subs {
                push_task(EntityKind::SubCategory, "design style", sub.slug, sub.name_en, sub.name_ar);
            }
        }

        let meta: Vec<(EntityKind, String)> =
            tasks.iter().map(|t| (t.kind, t.slug.clone())).collect();
        let results = process_in_chunks(
            tasks,
            DESCRIPTION_CHUNK_SIZE,
            self.chunk_interval,
            |task| async move {
                let description = self
                    .content
                    .entity_description(task.kind_label, &task.name)
                    .await?;
                Ok((task.slug, description))
            },
        )
        .await;

        let mut descriptions = existing;
        for ((kind, slug), result) in meta.into_iter().zip(results) {
            match result {
                Ok((slug, description)) => {
                    descriptions.insert(slug, description);
                }
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Description generation failed");
                    failures.push(SeedFailure {
                        kind,
                        entity: slug,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(descriptions)
    }

    // -----------------------------------------------------------------
    // Styles
    // -----------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    async fn seed_style(
        &self,
        sub: &SubCategory,
        approaches: &[Approach],
        colors: &[Color],
        room_types: &[RoomType],
        expected_room_total: usize,
        options: &SeedOptions,
        stats: &mut SeedStats,
        failures: &mut Vec<SeedFailure>,
    ) -> Result<(), SeedError> {
        let selection = match &options.manual_selection {
            Some(manual) => {
                if !approaches.iter().any(|a| a.id == manual.approach_id) {
                    return Err(SeedError::Input(format!(
                        "unknown approach id {}",
                        manual.approach_id
                    )));
                }
                if !colors.iter().any(|c| c.id == manual.color_id) {
                    return Err(SeedError::Input(format!(
                        "unknown color id {}",
                        manual.color_id
                    )));
                }
                StyleSelection {
                    approach_id: manual.approach_id.clone(),
                    color_id: manual.color_id.clone(),
                    confidence: 1.0,
                    reasoning: None,
                }
            }
            None => self.selector.select(sub, approaches, colors).await?,
        };
        let approach = approaches
            .iter()
            .find(|a| a.id == selection.approach_id)
            .ok_or_else(|| SeedError::Input("selection lost its approach".into()))?;
        let color = colors
            .iter()
            .find(|c| c.id == selection.color_id)
            .ok_or_else(|| SeedError::Input("selection lost its color".into()))?;

        let content = self
            .content
            .style_content(sub, approach, color, options.price_level)
            .await?;

        let outcomes = self.matcher.smart_match_batch(&content.material_names).await?;
        let mut material_ids = Vec::new();
        for outcome in &outcomes {
            if outcome.created {
                stats.materials_created += 1;
            } else {
                stats.materials_linked += 1;
            }
            if !material_ids.contains(&outcome.material_id) {
                material_ids.push(outcome.material_id.clone());
            }
        }

        let style_id = new_entity_id();
        let (gallery, hero_url) = if options.generate_images {
            let (gallery, tally) = self
                .images
                .golden_scene_gallery(
                    &style_id,
                    &content.title.en,
                    &content.color_palette,
                    options.price_level,
                )
                .await;
            stats.images_generated += tally.generated;
            stats.placeholders_used += tally.placeholders;
            let hero = gallery.first().map(|s| s.url.clone());
            (gallery, hero)
        } else {
            (Vec::new(), None)
        };

        let style = Style {
            id: style_id.clone(),
            sub_category_id: sub.id.clone(),
            approach_id: selection.approach_id.clone(),
            color_id: selection.color_id.clone(),
            content: content.clone(),
            gallery,
            room_profiles: Vec::new(),
            material_ids,
            price_level: options.price_level,
            metadata: StyleMetadata::default(),
        };
        self.styles.insert_style(style).await?;
        self.executions
            .record_style(&options.execution_id, &style_id)
            .await?;

        let planned = &room_types[..expected_room_total.min(room_types.len())];
        let all_rooms_done = self
            .fill_room_profiles(
                &style_id,
                &content.title,
                &content.color_palette,
                planned,
                0,
                hero_url.as_deref(),
                options,
                stats,
                failures,
            )
            .await?;
        if all_rooms_done {
            self.styles.mark_complete(&style_id).await?;
        }
        Ok(())
    }

    /// Resume an interrupted style at its next missing room profile.
    ///
    /// The append-only profile array makes the resume index simply the
    /// current length, measured against the run's frozen room total.
    async fn resume_style(
        &self,
        style: &Style,
        room_types: &[RoomType],
        expected_room_total: usize,
        options: &SeedOptions,
        stats: &mut SeedStats,
        failures: &mut Vec<SeedFailure>,
    ) -> Result<(), SeedError> {
        let start = style.room_profiles.len();
        let planned = &room_types[..expected_room_total.min(room_types.len())];
        tracing::info!(
            style_id = %style.id,
            resume_at = start,
            planned = planned.len(),
            "Resuming interrupted style",
        );

        let hero_url = style.gallery.first().map(|s| s.url.clone());
        let all_rooms_done = self
            .fill_room_profiles(
                &style.id,
                &style.content.title,
                &style.content.color_palette,
                planned,
                start,
                hero_url.as_deref(),
                options,
                stats,
                failures,
            )
            .await?;
        if all_rooms_done {
            self.styles.mark_complete(&style.id).await?;
            stats.styles_resumed += 1;
        }
        Ok(())
    }

    /// Generate and append room profiles `start..planned.len()`.
    ///
    /// Stops at the first failing room so the append-only array stays
    /// aligned with the room order; the style is left incomplete and a
    /// later run resumes it. Returns whether every planned room landed.
    #[allow(clippy::too_many_arguments)]
    async fn fill_room_profiles(
        &self,
        style_id: &str,
        style_title: &BilingualText,
        palette: &[String],
        planned: &[RoomType],
        start: usize,
        hero_url: Option<&str>,
        options: &SeedOptions,
        stats: &mut SeedStats,
        failures: &mut Vec<SeedFailure>,
    ) -> Result<bool, SeedError> {
        for room in planned.iter().skip(start) {
            let mut profile = match self
                .content
                .room_profile(style_title, room, options.price_level)
                .await
            {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!(
                        style_id,
                        room = %room.slug,
                        error = %e,
                        "Room profile failed; style left incomplete for resume",
                    );
                    failures.push(SeedFailure {
                        kind: EntityKind::RoomProfile,
                        entity: format!("{style_id}/{}", room.slug),
                        message: e.to_string(),
                    });
                    return Ok(false);
                }
            };

            if options.generate_images {
                let prompt = crate::prompts::scene_image_prompt(
                    &style_title.en,
                    &format!("a {} interior", room.name.en.to_lowercase()),
                    palette,
                    options.price_level,
                );
                let (urls, tally) = self
                    .images
                    .room_images(
                        style_id,
                        &room.slug,
                        &prompt,
                        options.images_per_room,
                        hero_url,
                    )
                    .await;
                stats.images_generated += tally.generated;
                stats.placeholders_used += tally.placeholders;
                profile.image_urls = urls;
            }

            self.styles.append_room_profile(style_id, profile).await?;
            stats.room_profiles += 1;
        }
        Ok(true)
    }

    fn report(
        &self,
        options: &SeedOptions,
        phase: &'static str,
        current: usize,
        total: usize,
        detail: impl Into<String>,
    ) {
        if let Some(progress) = &options.progress {
            progress(&SeedProgress {
                phase,
                current,
                total,
                detail: detail.into(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
