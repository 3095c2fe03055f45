use std::collections::BTreeSet;
use std::str::FromStr;

use accessgate_application::{
    EntityTypeCatalog, GrantQuery, LinkQuery, PermissionStore, RelationshipStore,
};
use accessgate_core::{ActorId, AppError, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::{
    ActorKind, EntityTypeDeclaration, PermissionGrant, PermissionLevel, RelationshipLink,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::warn;
use uuid::Uuid;

mod catalog;
mod grants;
mod links;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed permission store, relationship store and entity type
/// catalog.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a driver failure to [`AppError::Unavailable`] after logging it.
pub(crate) fn store_unavailable(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |error| {
        warn!(error = %error, "{context}");
        AppError::Unavailable(format!("{context}: {error}"))
    }
}

fn corrupt_row(context: &str, error: AppError) -> AppError {
    AppError::Internal(format!("{context}: {error}"))
}

fn uuids<T>(ids: &[T], as_uuid: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

fn codes(entity_types: &[EntityTypeCode]) -> Vec<String> {
    entity_types
        .iter()
        .map(|entity_type| entity_type.as_str().to_owned())
        .collect()
}
