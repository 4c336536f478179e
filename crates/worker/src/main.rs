//! `maison-worker` -- catalog seed runner.
//!
//! Drives one seed execution against the configured AI provider,
//! persisting into the in-memory store (dry-run mode) and reporting the
//! run's stats, failures, and provider telemetry at the end.
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default   | Description                          |
//! |------------------------------|----------|-----------|--------------------------------------|
//! | `MAISON_AI_API_KEY`          | yes      | --        | Primary provider key                 |
//! | `MAISON_AI_FALLBACK_API_KEY` | no       | --        | Fallback key; absence disables fallback |
//! | `SEED_EXECUTION_ID`          | no       | random    | Resume an earlier run by reusing its id |
//! | `SEED_GENERATE_IMAGES`       | no       | `true`    | Set `false` to skip all image work   |
//! | `SEED_IMAGES_PER_ROOM`       | no       | `2`       | Images generated per room profile    |
//! | `SEED_STYLE_LIMIT`           | no       | unlimited | Cap on newly generated styles        |
//! | `SEED_ONLY`                  | no       | all       | Comma list of entity kinds to seed   |
//! | `SEED_DRY_RUN`               | no       | `false`   | Plan the work queue, write nothing   |
//! | `SEED_CATEGORIES`            | no       | all       | Comma list of category slugs         |
//! | `SEED_SUB_CATEGORIES`        | no       | all       | Comma list of sub-category slugs     |
//! | `SEED_ROOM_TYPES`            | no       | all       | Comma list of room-type slugs        |
//! | `SEED_PRICE_LEVEL`           | no       | `regular` | `regular` or `luxury`                |

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maison_ai::{OperationLedger, ProviderConfig};
use maison_core::content::PriceLevel;
use maison_seeder::{EntityKind, OrchestratorConfig, SeedOptions, SeedOrchestrator, SeedProgress};
use maison_store::{InMemoryObjectStorage, InMemoryStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maison_worker=info,maison_seeder=info,maison_ai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let provider = ProviderConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Provider configuration failed");
        std::process::exit(1);
    });

    let execution_id = std::env::var("SEED_EXECUTION_ID")
        .unwrap_or_else(|_| format!("seed-{}", uuid::Uuid::new_v4()));
    let generate_images = std::env::var("SEED_GENERATE_IMAGES")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true);
    let images_per_room = std::env::var("SEED_IMAGES_PER_ROOM")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2);
    let style_limit = std::env::var("SEED_STYLE_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok());
    let dry_run = std::env::var("SEED_DRY_RUN")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    let only = std::env::var("SEED_ONLY").ok().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                let kind = EntityKind::parse(s);
                if kind.is_none() {
                    tracing::warn!(kind = s, "Ignoring unknown entity kind in SEED_ONLY");
                }
                kind
            })
            .collect::<Vec<_>>()
    });
    let slug_list = |name: &str| {
        std::env::var(name).ok().map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
    };
    let category_filter = slug_list("SEED_CATEGORIES");
    let sub_category_filter = slug_list("SEED_SUB_CATEGORIES");
    let room_type_filter = slug_list("SEED_ROOM_TYPES");
    let price_level = std::env::var("SEED_PRICE_LEVEL")
        .map(|v| PriceLevel::from_str(&v))
        .unwrap_or_default();

    tracing::info!(
        execution_id = %execution_id,
        generate_images,
        ?style_limit,
        price_level = price_level.as_str(),
        text_model = %provider.text_model,
        image_model = %provider.image_model,
        "Starting maison-worker seed run",
    );

    let ledger = Arc::new(OperationLedger::default());
    let gateway = Arc::new(provider.build_gateway(ledger.clone()));

    let store = Arc::new(InMemoryStore::new());
    let storage = Arc::new(InMemoryObjectStorage::new());
    let orchestrator = SeedOrchestrator::new(
        gateway,
        store.clone(),
        store.clone(),
        store.clone(),
        storage,
        OrchestratorConfig::new(provider.text_model.clone(), provider.image_model.clone()),
    );

    let options = SeedOptions {
        generate_images,
        images_per_room,
        style_limit,
        only,
        dry_run,
        category_filter,
        sub_category_filter,
        room_type_filter,
        price_level,
        progress: Some(Arc::new(|p: &SeedProgress| {
            tracing::info!(
                phase = p.phase,
                current = p.current,
                total = p.total,
                detail = %p.detail,
                "Seed progress",
            );
        })),
        ..SeedOptions::new(execution_id)
    };

    let result = match orchestrator.run(&options).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Seed run aborted");
            std::process::exit(1);
        }
    };

    for failure in &result.failures {
        tracing::warn!(
            kind = failure.kind.as_str(),
            entity = %failure.entity,
            message = %failure.message,
            "Collected failure",
        );
    }

    let metrics = ledger.snapshot();
    tracing::info!(
        execution_id = %result.execution_id,
        status = result.status.as_str(),
        styles_planned = result.stats.styles_planned,
        styles_created = result.stats.styles_created,
        styles_resumed = result.stats.styles_resumed,
        styles_skipped = result.stats.styles_skipped,
        room_profiles = result.stats.room_profiles,
        materials_linked = result.stats.materials_linked,
        materials_created = result.stats.materials_created,
        images_generated = result.stats.images_generated,
        placeholders_used = result.stats.placeholders_used,
        operations = metrics.total_operations,
        total_cost_usd = metrics.total_cost_usd,
        "Seed run finished",
    );
}
