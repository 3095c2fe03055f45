use accessgate_application::{EntityQuery, EntityRecord, EntityRecordReader};
use accessgate_core::{AppError, AppResult, EntityId, EntityTypeCode};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_access_repository::store_unavailable;
use crate::postgres_query_fragments::{Projection, build_entity_query};


const UNDEFINED_TABLE: &str = "42P01";

/// PostgreSQL reader executing composed entity queries.
///
/// Each entity type is stored in its own table named after the type code,
/// inside one schema, with at least `id uuid`, `name text` and
/// `active boolean` columns.
#[derive(Clone)]
pub struct PostgresEntityRecordReader {
    pool: PgPool,
    schema: String,
}

impl PostgresEntityRecordReader {
    /// Creates a reader over tables in `schema`.
    pub fn new(pool: PgPool, schema: impl Into<String>) -> AppResult<Self> {
        let schema = schema.into();
        // Same identifier rules as entity type codes.
        EntityTypeCode::new(schema.as_str()).map_err(|_| {
            AppError::Validation(format!("invalid entity schema name '{schema}'"))
        })?;

        Ok(Self { pool, schema })
    }

    /// Returns the schema entity tables live in.
    #[must_use]
    pub fn schema(&self) -> &str {
        self.schema.as_str()
    }
}

#[derive(Debug, FromRow)]
struct EntityRecordRow {
    id: Uuid,
    name: String,
    active: bool,
}

#[derive(Debug, FromRow)]
struct CountRow {
    total: i64,
}

fn read_error(entity_type: &EntityTypeCode) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |error| match &error {
        sqlx::Error::Database(database_error)
            if database_error.code().as_deref() == Some(UNDEFINED_TABLE) =>
        {
            AppError::NotFound(format!("no table stores entity type '{entity_type}'"))
        }
        _ => store_unavailable("failed to read entity records")(error),
    }
}

#[async_trait]
impl EntityRecordReader for PostgresEntityRecordReader {
    async fn count_records(&self, query: &EntityQuery) -> AppResult<u64> {
        let mut builder = build_entity_query(self.schema.as_str(), query, Projection::Count)?;
        let row = builder
            .build_query_as::<CountRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(read_error(&query.entity_type))?;

        u64::try_from(row.total)
            .map_err(|error| AppError::Internal(format!("invalid entity record count: {error}")))
    }

    async fn list_records(&self, query: &EntityQuery) -> AppResult<Vec<EntityRecord>> {
        let mut builder = build_entity_query(self.schema.as_str(), query, Projection::Rows)?;
        let rows = builder
            .build_query_as::<EntityRecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(read_error(&query.entity_type))?;

        Ok(rows
            .into_iter()
            .map(|row| EntityRecord {
                id: EntityId::from_uuid(row.id),
                entity_type: query.entity_type.clone(),
                name: row.name,
                active: row.active,
            })
            .collect())
    }
}
