//! Seed orchestration pipeline.
//!
//! Drives entity generation (approaches → room types → categories →
//! sub-categories → styles) against the generative gateway, with
//! resumable, rate-limited, per-entity-fault-tolerant execution.

pub mod content;
pub mod error;
pub mod images;
pub mod materials;
pub mod orchestrator;
pub mod prompts;
pub mod seed_data;
pub mod selector;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SeedError;
pub use orchestrator::{
    EntityKind, ManualSelection, OrchestratorConfig, ProgressFn, SeedFailure, SeedOptions,
    SeedOrchestrator, SeedProgress, SeedResult, SeedStats,
};
