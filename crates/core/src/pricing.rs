//! Token accounting and per-model cost estimation.
//!
//! Every generative backend reports usage as the same token triple, so
//! cost estimation needs no backend-specific branching. Prices are USD
//! per 1K tokens; unknown models fall back to [`DEFAULT_PRICING`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token usage
// ---------------------------------------------------------------------------

/// Uniform usage triple reported by every backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Fold another usage record into this one.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

// ---------------------------------------------------------------------------
// Price table
// ---------------------------------------------------------------------------

/// USD per 1K prompt/completion tokens for one model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Fallback price row for models missing from the table.
pub const DEFAULT_PRICING: ModelPricing = ModelPricing {
    input_per_1k: 0.001,
    output_per_1k: 0.002,
};

/// Known model price rows. Matched by prefix so dated model revisions
/// (e.g. `gemini-2.0-flash-001`) share their family's row.
const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    (
        "gemini-2.0-flash",
        ModelPricing {
            input_per_1k: 0.0001,
            output_per_1k: 0.0004,
        },
    ),
    (
        "gemini-1.5-flash",
        ModelPricing {
            input_per_1k: 0.000075,
            output_per_1k: 0.0003,
        },
    ),
    (
        "gemini-1.5-pro",
        ModelPricing {
            input_per_1k: 0.00125,
            output_per_1k: 0.005,
        },
    ),
    (
        "imagen-3.0",
        ModelPricing {
            input_per_1k: 0.002,
            output_per_1k: 0.004,
        },
    ),
];

/// Look up the price row for a model, falling back to the default row.
pub fn pricing_for(model: &str) -> ModelPricing {
    PRICE_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_PRICING)
}

/// Estimated USD cost for one call's usage against one model.
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let p = pricing_for(model);
    (usage.prompt_tokens as f64 / 1000.0) * p.input_per_1k
        + (usage.completion_tokens as f64 / 1000.0) * p.output_per_1k
}
