//! Material-matching sub-pipeline.
//!
//! Free-text material names coming out of content generation are
//! resolved to catalog material ids in three layers: the zero-cost
//! heuristic cascade, then batched AI matching for whatever the
//! heuristics could not settle, then validation that self-heals any AI
//! answer referencing ids that do not exist. Every input name always
//! resolves; an unresolvable name becomes a newly created material.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;

use maison_ai::{Gateway, GenerateOptions};
use maison_core::matching::{
    heuristic_match, infer_material_category, HeuristicHit, MatcherConfig, MaterialCandidate,
};
use maison_core::types::{BilingualText, EntityId};
use maison_store::{new_entity_id, CatalogStore, Material, MaterialCategory, MaterialType};

use crate::error::SeedError;
use crate::prompts;

/// Temperature for the matching call; this is a classification task.
const MATCH_TEMPERATURE: f32 = 0.2;

/// Confidence assigned to a self-healed creation with no usable AI
/// answer behind it.
const HEALED_CREATE_CONFIDENCE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Final resolution of one input name.
#[derive(Debug, Clone)]
pub struct MaterialMatchOutcome {
    pub input_name: String,
    pub material_id: EntityId,
    pub confidence: f64,
    /// True when the name resolved by creating a new material.
    pub created: bool,
}

/// A name the heuristic cascade could not settle. A sub-threshold hit
/// is kept as the fallback if the AI layer fails too.
#[derive(Debug)]
struct Unresolved {
    index: usize,
    name: String,
    fallback: Option<HeuristicHit>,
}

// ---------------------------------------------------------------------------
// AI response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AiMatchResponse {
    results: Vec<AiMatchResult>,
}

#[derive(Debug, Deserialize)]
struct AiMatchResult {
    input_name: String,
    action: String,
    #[serde(default)]
    matched_material_id: Option<String>,
    confidence: f64,
    #[serde(default)]
    new_material: Option<AiNewMaterial>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiNewMaterial {
    name: BilingualText,
    category_id: String,
    type_id: String,
    #[serde(default)]
    description: Option<BilingualText>,
}

/// Validated decision for one unresolved name.
#[derive(Debug)]
enum Resolution {
    Link {
        material_id: EntityId,
        confidence: f64,
    },
    Create {
        name: BilingualText,
        category_id: EntityId,
        type_id: EntityId,
        description: BilingualText,
        confidence: f64,
    },
}

// ---------------------------------------------------------------------------
// Pure layers
// ---------------------------------------------------------------------------

/// Run the heuristic cascade over deduplicated names.
///
/// Names whose hit reaches the bypass threshold are resolved outright;
/// the rest go to the AI layer, carrying any weaker hit as a fallback.
/// Both lists carry the position within the deduplicated input so the
/// final result can be reassembled in input order.
fn partition_by_heuristic(
    names: &[String],
    candidates: &[MaterialCandidate],
    config: &MatcherConfig,
) -> (Vec<(usize, MaterialMatchOutcome)>, Vec<Unresolved>) {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    let mut seen = HashSet::new();

    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        let index = resolved.len() + unresolved.len();
        match heuristic_match(trimmed, candidates, config) {
            Some(hit) if hit.confidence >= config.ai_bypass_threshold => {
                resolved.push((
                    index,
                    MaterialMatchOutcome {
                        input_name: trimmed.to_string(),
                        material_id: hit.id,
                        confidence: hit.confidence,
                        created: false,
                    },
                ));
            }
            fallback => unresolved.push(Unresolved {
                index,
                name: trimmed.to_string(),
                fallback,
            }),
        }
    }

    (resolved, unresolved)
}

/// Validate one AI answer against the known catalog, healing whatever
/// does not hold up.
///
/// * link to an unknown id: downgraded to the heuristic fallback when
///   one exists, otherwise converted to a creation;
/// * creation referencing unknown category/type ids: re-pointed at the
///   keyword-inferred category and the first known type;
/// * no answer at all for the name: same creation path.
fn resolve_ai_result(
    name: &str,
    result: Option<&AiMatchResult>,
    fallback: Option<&HeuristicHit>,
    known_material_ids: &HashSet<&str>,
    categories: &[MaterialCategory],
    types: &[MaterialType],
) -> Resolution {
    if let Some(result) = result {
        if result.action == "link" {
            if let Some(id) = &result.matched_material_id {
                if known_material_ids.contains(id.as_str()) {
                    return Resolution::Link {
                        material_id: id.clone(),
                        confidence: result.confidence,
                    };
                }
                tracing::warn!(
                    input_name = name,
                    matched_material_id = %id,
                    "AI linked an unknown material id; healing",
                );
            }
        }
        if result.action == "create" {
            if let Some(spec) = &result.new_material {
                return Resolution::Create {
                    name: spec.name.clone(),
                    category_id: heal_category_id(&spec.category_id, name, categories),
                    type_id: heal_type_id(&spec.type_id, types),
                    description: spec.description.clone().unwrap_or_default(),
                    confidence: result.confidence,
                };
            }
        }
    }

    if let Some(hit) = fallback {
        return Resolution::Link {
            material_id: hit.id.clone(),
            confidence: hit.confidence,
        };
    }

    Resolution::Create {
        name: BilingualText::new(name, name),
        category_id: heal_category_id("", name, categories),
        type_id: heal_type_id("", types),
        description: BilingualText::default(),
        confidence: HEALED_CREATE_CONFIDENCE,
    }
}

/// Keep a known category id, otherwise infer one from the name's
/// keywords, otherwise take the first category.
fn heal_category_id(raw_id: &str, name: &str, categories: &[MaterialCategory]) -> EntityId {
    if categories.iter().any(|c| c.id == raw_id) {
        return raw_id.to_string();
    }
    let inferred_slug = infer_material_category(name);
    categories
        .iter()
        .find(|c| c.slug == inferred_slug)
        .or_else(|| categories.first())
        .map(|c| c.id.clone())
        .unwrap_or_default()
}

fn heal_type_id(raw_id: &str, types: &[MaterialType]) -> EntityId {
    if types.iter().any(|t| t.id == raw_id) {
        return raw_id.to_string();
    }
    types.first().map(|t| t.id.clone()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

pub struct MaterialMatcher {
    gateway: Arc<Gateway>,
    catalog: Arc<dyn CatalogStore>,
    config: MatcherConfig,
    base: GenerateOptions,
}

impl MaterialMatcher {
    pub fn new(
        gateway: Arc<Gateway>,
        catalog: Arc<dyn CatalogStore>,
        config: MatcherConfig,
        base: GenerateOptions,
    ) -> Self {
        Self {
            gateway,
            catalog,
            config,
            base,
        }
    }

    /// Resolve a batch of free-text names to material ids.
    ///
    /// Returns one outcome per unique non-empty input name. New
    /// materials are inserted into the catalog as part of the call.
    pub async fn smart_match_batch(
        &self,
        names: &[String],
    ) -> Result<Vec<MaterialMatchOutcome>, SeedError> {
        let materials = self.catalog.list_materials().await?;
        let candidates: Vec<MaterialCandidate> = materials
            .iter()
            .map(|m| MaterialCandidate {
                id: m.id.clone(),
                name: m.name.clone(),
            })
            .collect();

        let (resolved, unresolved) = partition_by_heuristic(names, &candidates, &self.config);
        tracing::debug!(
            total = resolved.len() + unresolved.len(),
            heuristic_hits = resolved.len(),
            to_ai = unresolved.len(),
            "Material batch partitioned",
        );
        let mut indexed = resolved;
        if unresolved.is_empty() {
            return Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect());
        }

        let categories = self.catalog.list_material_categories().await?;
        let types = self.catalog.list_material_types().await?;
        let known_ids: HashSet<&str> = materials.iter().map(|m| m.id.as_str()).collect();

        for chunk in unresolved.chunks(self.config.ai_batch_size.max(1)) {
            let chunk_names: Vec<String> = chunk.iter().map(|u| u.name.clone()).collect();
            let response = self
                .gateway
                .generate_structured::<AiMatchResponse>(
                    "material_match",
                    &prompts::material_match_prompt(&chunk_names, &materials, &categories, &types),
                    prompts::material_match_schema(),
                    &GenerateOptions {
                        temperature: MATCH_TEMPERATURE,
                        ..self.base.clone()
                    },
                )
                .await;

            // AI trouble degrades to the heal path; it never fails the batch.
            let by_name: HashMap<String, AiMatchResult> = match response {
                Ok(out) => out
                    .value
                    .results
                    .into_iter()
                    .map(|r| (r.input_name.trim().to_lowercase(), r))
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "AI material matching failed; healing whole chunk");
                    HashMap::new()
                }
            };

            for item in chunk {
                let result = by_name.get(&item.name.to_lowercase());
                if let Some(result) = result {
                    if let Some(reasoning) = &result.reasoning {
                        tracing::debug!(input_name = %item.name, reasoning, "AI match reasoning");
                    }
                }
                let resolution = resolve_ai_result(
                    &item.name,
                    result,
                    item.fallback.as_ref(),
                    &known_ids,
                    &categories,
                    &types,
                );
                let outcome = match resolution {
                    Resolution::Link {
                        material_id,
                        confidence,
                    } => MaterialMatchOutcome {
                        input_name: item.name.clone(),
                        material_id,
                        confidence,
                        created: false,
                    },
                    Resolution::Create {
                        name,
                        category_id,
                        type_id,
                        description,
                        confidence,
                    } => {
                        let material = self
                            .catalog
                            .insert_material(Material {
                                id: new_entity_id(),
                                name,
                                category_id,
                                type_id,
                                description,
                            })
                            .await?;
                        tracing::info!(
                            input_name = %item.name,
                            material_id = %material.id,
                            "Created material for unmatched name",
                        );
                        MaterialMatchOutcome {
                            input_name: item.name.clone(),
                            material_id: material.id,
                            confidence,
                            created: true,
                        }
                    }
                };
                indexed.push((item.index, outcome));
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_options, stub_gateway, StubBackend};
    use maison_store::InMemoryStore;

    fn candidates() -> Vec<MaterialCandidate> {
        vec![
            MaterialCandidate {
                id: "mat-marble".into(),
                name: BilingualText::new("Marble", "رخام"),
            },
            MaterialCandidate {
                id: "mat-velvet".into(),
                name: BilingualText::new("Velvet", "مخمل"),
            },
        ]
    }

    fn categories() -> Vec<MaterialCategory> {
        vec![
            MaterialCategory {
                id: "cat-stone".into(),
                slug: "stone".into(),
                name: BilingualText::new("Stone", "حجر"),
            },
            MaterialCategory {
                id: "cat-composite".into(),
                slug: "composite".into(),
                name: BilingualText::new("Composite", "مركب"),
            },
        ]
    }

    fn types() -> Vec<MaterialType> {
        vec![MaterialType {
            id: "type-natural".into(),
            slug: "natural".into(),
            name: BilingualText::new("Natural", "طبيعي"),
        }]
    }

    // -- partition --

    #[test]
    fn strong_hits_bypass_ai() {
        let (resolved, unresolved) = partition_by_heuristic(
            &["Marble".into(), "Chandelier".into()],
            &candidates(),
            &MatcherConfig::default(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].1.material_id, "mat-marble");
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].name, "Chandelier");
        assert_eq!(unresolved[0].index, 1);
    }

    #[test]
    fn sub_threshold_hit_goes_to_ai_with_fallback() {
        // Token-stage hit (0.8) is below the 0.85 bypass threshold.
        let cands = vec![MaterialCandidate {
            id: "mat-brass".into(),
            name: BilingualText::new("Brushed Brass Hardware", ""),
        }];
        let (resolved, unresolved) = partition_by_heuristic(
            &["matte hardware finish".into()],
            &cands,
            &MatcherConfig::default(),
        );
        assert!(resolved.is_empty());
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].fallback.as_ref().unwrap().id, "mat-brass");
    }

    #[test]
    fn duplicate_and_empty_names_collapse() {
        let (resolved, unresolved) = partition_by_heuristic(
            &["Marble".into(), "  marble ".into(), "".into()],
            &candidates(),
            &MatcherConfig::default(),
        );
        assert_eq!(resolved.len() + unresolved.len(), 1);
    }

    // -- validation healing --

    fn known_ids() -> HashSet<&'static str> {
        ["mat-marble", "mat-velvet"].into_iter().collect()
    }

    #[test]
    fn valid_link_passes_through() {
        let result = AiMatchResult {
            input_name: "carrara".into(),
            action: "link".into(),
            matched_material_id: Some("mat-marble".into()),
            confidence: 0.92,
            new_material: None,
            reasoning: None,
        };
        let resolution = resolve_ai_result(
            "carrara",
            Some(&result),
            None,
            &known_ids(),
            &categories(),
            &types(),
        );
        assert!(
            matches!(resolution, Resolution::Link { material_id, confidence } if material_id == "mat-marble" && confidence == 0.92)
        );
    }

    #[test]
    fn link_to_unknown_id_uses_heuristic_fallback() {
        let result = AiMatchResult {
            input_name: "carrara".into(),
            action: "link".into(),
            matched_material_id: Some("mat-ghost".into()),
            confidence: 0.9,
            new_material: None,
            reasoning: None,
        };
        let fallback = HeuristicHit {
            id: "mat-marble".into(),
            confidence: 0.8,
            stage: maison_core::matching::MatchStage::Token,
        };
        let resolution = resolve_ai_result(
            "carrara",
            Some(&result),
            Some(&fallback),
            &known_ids(),
            &categories(),
            &types(),
        );
        assert!(
            matches!(resolution, Resolution::Link { material_id, .. } if material_id == "mat-marble")
        );
    }

    #[test]
    fn create_with_bogus_ids_is_healed_by_inference() {
        let result = AiMatchResult {
            input_name: "Travertine slab".into(),
            action: "create".into(),
            matched_material_id: None,
            confidence: 0.7,
            new_material: Some(AiNewMaterial {
                name: BilingualText::new("Travertine", "ترافرتين"),
                category_id: "cat-ghost".into(),
                type_id: "type-ghost".into(),
                description: None,
            }),
            reasoning: None,
        };
        let resolution = resolve_ai_result(
            "Travertine slab",
            Some(&result),
            None,
            &known_ids(),
            &categories(),
            &types(),
        );
        match resolution {
            Resolution::Create {
                category_id,
                type_id,
                ..
            } => {
                // "travertine" keyword infers the stone category.
                assert_eq!(category_id, "cat-stone");
                assert_eq!(type_id, "type-natural");
            }
            other => panic!("expected creation, got {other:?}"),
        }
    }

    #[test]
    fn missing_answer_without_fallback_creates() {
        let resolution = resolve_ai_result(
            "mystery substance",
            None,
            None,
            &known_ids(),
            &categories(),
            &types(),
        );
        match resolution {
            Resolution::Create {
                category_id,
                confidence,
                ..
            } => {
                assert_eq!(category_id, "cat-composite");
                assert_eq!(confidence, HEALED_CREATE_CONFIDENCE);
            }
            other => panic!("expected creation, got {other:?}"),
        }
    }

    // -- end to end --

    fn seeded_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new().with_materials(
            vec![Material {
                id: "mat-marble".into(),
                name: BilingualText::new("Marble", "رخام"),
                category_id: "cat-stone".into(),
                type_id: "type-natural".into(),
                description: BilingualText::default(),
            }],
            categories(),
            types(),
        ))
    }

    #[tokio::test]
    async fn batch_resolves_every_name() {
        let backend = StubBackend::new();
        let store = seeded_store();
        let matcher = MaterialMatcher::new(
            stub_gateway(backend),
            store.clone(),
            MatcherConfig::default(),
            fast_options(),
        );

        // "Marble" links heuristically; "Chandelier" misses everything,
        // the stub AI returns no answer, and the heal path creates it.
        let outcomes = matcher
            .smart_match_batch(&["Marble".into(), "Chandelier".into()])
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].material_id, "mat-marble");
        assert!(!outcomes[0].created);
        assert!(outcomes[1].created);

        let materials = store.list_materials().await.unwrap();
        assert_eq!(materials.len(), 2);
    }

    #[tokio::test]
    async fn ai_link_answer_is_honored() {
        let backend = StubBackend::new();
        backend.push(
            "results",
            Ok(serde_json::json!({
                "results": [{
                    "input_name": "polished stone slab",
                    "action": "link",
                    "matched_material_id": "mat-marble",
                    "confidence": 0.88,
                }]
            })),
        );
        let store = seeded_store();
        // Raise the bypass bar above the synonym-stage confidence so
        // this name reaches the AI layer.
        let config = MatcherConfig {
            ai_bypass_threshold: 0.95,
            ..Default::default()
        };
        let matcher =
            MaterialMatcher::new(stub_gateway(backend), store.clone(), config, fast_options());

        let outcomes = matcher
            .smart_match_batch(&["polished stone slab".into()])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].material_id, "mat-marble");
        assert_eq!(outcomes[0].confidence, 0.88);
        assert!(!outcomes[0].created);
    }
}
