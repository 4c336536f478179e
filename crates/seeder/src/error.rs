use maison_ai::GatewayError;
use maison_store::StoreError;

/// Errors raised inside one entity's pipeline.
///
/// These never escape the orchestrator's per-item loop boundary; they
/// are collected into the run's error list with the entity identifier.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Seed input error: {0}")]
    Input(String),
}
