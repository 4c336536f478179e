//! Heuristic material-name matching.
//!
//! The zero-cost pre-filter that runs before any AI matching call. A
//! four-stage cascade resolves the common case (near-identical names)
//! for free; only names that fall below the bypass threshold are sent
//! to the AI batch matcher.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{BilingualText, EntityId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the heuristic cascade.
///
/// The confidence values and the AI-bypass threshold are hand-tuned
/// constants carried as configuration, not verified-optimal values.
/// Callers asserting on them should treat them as black-box parameters;
/// only the stage ordering (exact > substring > synonym > token) is
/// contractual.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Confidence for a case-insensitive exact name match.
    pub exact_confidence: f64,
    /// Confidence for substring containment in either direction.
    pub substring_confidence: f64,
    /// Confidence for a cross-language synonym-table hit.
    pub synonym_confidence: f64,
    /// Confidence for a token-level partial match.
    pub token_confidence: f64,
    /// Heuristic confidence at or above which the AI matcher is skipped.
    pub ai_bypass_threshold: f64,
    /// How many unresolved names go into one AI matching request.
    pub ai_batch_size: usize,
    /// Minimum token length considered in the token-match stage.
    pub min_token_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            exact_confidence: 1.0,
            substring_confidence: 0.9,
            synonym_confidence: 0.85,
            token_confidence: 0.8,
            ai_bypass_threshold: 0.85,
            ai_batch_size: 10,
            min_token_len: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate / hit types
// ---------------------------------------------------------------------------

/// A catalog material offered to the matcher as a link target.
#[derive(Debug, Clone)]
pub struct MaterialCandidate {
    pub id: EntityId,
    pub name: BilingualText,
}

/// Which cascade stage produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Exact,
    Substring,
    Synonym,
    Token,
}

/// A successful heuristic match.
#[derive(Debug, Clone)]
pub struct HeuristicHit {
    pub id: EntityId,
    pub confidence: f64,
    pub stage: MatchStage,
}

// ---------------------------------------------------------------------------
// Synonym table
// ---------------------------------------------------------------------------

/// Fixed bilingual synonym pairs (English keyword, Arabic term).
///
/// Lets an English input like "marble" match a candidate whose catalog
/// name is only Arabic, and vice versa.
const SYNONYMS: &[(&str, &str)] = &[
    ("marble", "رخام"),
    ("granite", "جرانيت"),
    ("stone", "حجر"),
    ("wood", "خشب"),
    ("oak", "بلوط"),
    ("walnut", "جوز"),
    ("glass", "زجاج"),
    ("steel", "فولاذ"),
    ("brass", "نحاس"),
    ("copper", "نحاس أحمر"),
    ("leather", "جلد"),
    ("linen", "كتان"),
    ("velvet", "مخمل"),
    ("silk", "حرير"),
    ("cotton", "قطن"),
    ("wool", "صوف"),
    ("ceramic", "سيراميك"),
    ("porcelain", "بورسلين"),
    ("concrete", "خرسانة"),
    ("bamboo", "خيزران"),
    ("rattan", "روطان"),
    ("gold", "ذهب"),
];

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Run the four-stage cascade against the candidate list.
///
/// Stages, cheapest first; the first stage producing a hit wins:
/// 1. case-insensitive exact equality against either locale name;
/// 2. substring containment in either direction;
/// 3. cross-language synonym lookup via the fixed bilingual table;
/// 4. token-level partial match (tokens of at least
///    [`MatcherConfig::min_token_len`] chars found inside a candidate
///    name).
///
/// Returns `None` when all four stages miss.
pub fn heuristic_match(
    name: &str,
    candidates: &[MaterialCandidate],
    config: &MatcherConfig,
) -> Option<HeuristicHit> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() || candidates.is_empty() {
        return None;
    }

    // Stage 1: exact equality.
    for c in candidates {
        if c.name.en.to_lowercase() == needle || c.name.ar.to_lowercase() == needle {
            return Some(HeuristicHit {
                id: c.id.clone(),
                confidence: config.exact_confidence,
                stage: MatchStage::Exact,
            });
        }
    }

    // Stage 2: substring containment, either direction.
    for c in candidates {
        for cand_name in [c.name.en.to_lowercase(), c.name.ar.to_lowercase()] {
            if cand_name.is_empty() {
                continue;
            }
            if needle.contains(&cand_name) || cand_name.contains(&needle) {
                return Some(HeuristicHit {
                    id: c.id.clone(),
                    confidence: config.substring_confidence,
                    stage: MatchStage::Substring,
                });
            }
        }
    }

    // Stage 3: cross-language synonym lookup.
    for (en_term, ar_term) in SYNONYMS {
        let input_has = needle.contains(en_term) || needle.contains(ar_term);
        if !input_has {
            continue;
        }
        for c in candidates {
            let cand_en = c.name.en.to_lowercase();
            if cand_en.contains(en_term) || c.name.ar.contains(ar_term) {
                return Some(HeuristicHit {
                    id: c.id.clone(),
                    confidence: config.synonym_confidence,
                    stage: MatchStage::Synonym,
                });
            }
        }
    }

    // Stage 4: token-level partial match.
    for token in tokens_of(&needle, config.min_token_len) {
        for c in candidates {
            let cand_en = c.name.en.to_lowercase();
            let cand_ar = c.name.ar.to_lowercase();
            if cand_en.contains(token) || cand_ar.contains(token) {
                return Some(HeuristicHit {
                    id: c.id.clone(),
                    confidence: config.token_confidence,
                    stage: MatchStage::Token,
                });
            }
        }
    }

    None
}

/// Split a lowercased name into tokens of at least `min_len` chars.
fn tokens_of(needle: &str, min_len: usize) -> Vec<&str> {
    needle
        .split(|ch: char| ch.is_whitespace() || ch == '-' || ch == '_' || ch == ',' || ch == '/')
        .filter(|t| t.chars().count() >= min_len)
        .collect()
}

// ---------------------------------------------------------------------------
// Keyword category inference
// ---------------------------------------------------------------------------

/// Regex keyword table mapping material names to category slugs.
static CATEGORY_KEYWORDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)marble|granite|stone|travertine|onyx|quartz|رخام|جرانيت|حجر", "stone"),
        (r"(?i)wood|oak|walnut|teak|birch|ash|timber|mahogany|خشب|بلوط", "wood"),
        (r"(?i)steel|iron|brass|copper|bronze|chrome|metal|aluminium|فولاذ|نحاس|معدن", "metal"),
        (r"(?i)cotton|linen|wool|velvet|silk|boucle|fabric|textile|قطن|كتان|مخمل|حرير|قماش", "textile"),
        (r"(?i)glass|crystal|زجاج", "glass"),
        (r"(?i)ceramic|porcelain|terracotta|tile|سيراميك|بورسلين|بلاط", "ceramic"),
        (r"(?i)leather|suede|جلد", "leather"),
        (r"(?i)concrete|cement|plaster|خرسانة|جبس", "mineral"),
    ]
    .into_iter()
    .map(|(pattern, slug)| (Regex::new(pattern).expect("static keyword regex"), slug))
    .collect()
});

/// Fallback category slug when no keyword matches.
pub const DEFAULT_MATERIAL_CATEGORY: &str = "composite";

/// Infer a material category slug from a free-text material name.
///
/// Used to self-heal AI match results that reference unknown category
/// ids: the inferred slug is resolved against the real category list by
/// the caller.
pub fn infer_material_category(name: &str) -> &'static str {
    for (regex, slug) in CATEGORY_KEYWORDS.iter() {
        if regex.is_match(name) {
            return slug;
        }
    }
    DEFAULT_MATERIAL_CATEGORY
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
