//! Accessgate inspector: answers permission questions against a live database.

#![forbid(unsafe_code)]

mod inspector_config;

use std::sync::Arc;

use accessgate_application::{EntityListService, PermissionResolutionService, RbacGate};
use accessgate_core::{AppError, AppResult};
use accessgate_domain::PermissionLevel;
use accessgate_infrastructure::{MIGRATOR, PostgresAccessRepository, PostgresEntityRecordReader};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::inspector_config::{InspectorCommand, InspectorConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = InspectorConfig::load()?;
    let pool = connect_pool(&config).await?;

    if config.command == InspectorCommand::Migrate {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;
        info!("access tables migrated");
        return Ok(());
    }

    let repository = Arc::new(PostgresAccessRepository::new(pool.clone()));
    let rbac_gate = RbacGate::new(PermissionResolutionService::new(
        repository.clone(),
        repository.clone(),
        repository,
    ));
    let reader = Arc::new(PostgresEntityRecordReader::new(
        pool,
        config.entity_schema.as_str(),
    )?);

    let output = run_command(&rbac_gate, reader, config.command).await?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");

    Ok(())
}

async fn run_command(
    rbac_gate: &RbacGate,
    reader: Arc<PostgresEntityRecordReader>,
    command: InspectorCommand,
) -> AppResult<Value> {
    let resolution = rbac_gate.resolution_service();

    match command {
        InspectorCommand::Migrate => Ok(json!({ "migrated": true })),
        InspectorCommand::MaxLevel {
            actor_id,
            entity_type,
            entity_id,
        } => {
            let level = resolution
                .max_level(actor_id, &entity_type, entity_id)
                .await?;
            info!(%actor_id, entity_type = entity_type.as_str(), "resolved max level");

            Ok(json!({
                "actor_id": actor_id,
                "entity_type": entity_type,
                "entity_id": entity_id,
                "level": level.map(|level| level.as_str()),
                "value": PermissionLevel::value_or_no_access(level),
            }))
        }
        InspectorCommand::Accessible {
            actor_id,
            entity_type,
            min_level,
        } => {
            let accessible = resolution
                .accessible_ids(actor_id, &entity_type, min_level)
                .await?;
            info!(
                %actor_id,
                entity_type = entity_type.as_str(),
                all = accessible.is_all(),
                "resolved accessible ids"
            );

            Ok(json!({
                "actor_id": actor_id,
                "entity_type": entity_type,
                "min_level": min_level,
                "accessible": accessible,
            }))
        }
        InspectorCommand::Check {
            actor_id,
            entity_type,
            entity_id,
            min_level,
        } => {
            let allowed = rbac_gate
                .check_one(actor_id, &entity_type, entity_id, min_level)
                .await?;

            Ok(json!({
                "actor_id": actor_id,
                "entity_type": entity_type,
                "entity_id": entity_id,
                "min_level": min_level,
                "allowed": allowed,
            }))
        }
        InspectorCommand::List { actor_id, request } => {
            let service = EntityListService::new(rbac_gate.clone(), reader);
            let page = service.list(actor_id, request).await?;
            info!(%actor_id, total = page.total, "listed entity page");

            serde_json::to_value(page)
                .map_err(|error| AppError::Internal(format!("failed to encode page: {error}")))
        }
    }
}

async fn connect_pool(config: &InspectorConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}
