use accessgate_core::{AppResult, EntityId, EntityTypeCode};
use async_trait::async_trait;
use serde::Serialize;

use crate::EntityQuery;

/// Projection of one listed entity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    /// Row identifier.
    pub id: EntityId,
    /// Entity type of the row.
    pub entity_type: EntityTypeCode,
    /// Display name.
    pub name: String,
    /// Activation flag.
    pub active: bool,
}

/// Query executor port for composed entity queries.
#[async_trait]
pub trait EntityRecordReader: Send + Sync {
    /// Counts distinct rows matching the query, ignoring pagination.
    async fn count_records(&self, query: &EntityQuery) -> AppResult<u64>;

    /// Lists distinct rows matching the query, applying pagination.
    async fn list_records(&self, query: &EntityQuery) -> AppResult<Vec<EntityRecord>>;
}
