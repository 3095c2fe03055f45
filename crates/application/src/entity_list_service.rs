use std::sync::Arc;

use accessgate_core::{ActorId, AppError, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::PermissionLevel;
use serde::Serialize;
use tracing::debug;

use crate::RbacGate;
use crate::access_ports::{EntityRecord, EntityRecordReader};
use crate::parent_scope_gate::scope_to_parent;
use crate::query_fragments::{EntityQuery, QueryAlias, RecordPredicate};


/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: usize = 500;

const ROOT_ALIAS: &str = "e";

/// Parent instance a listing is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContext {
    /// Parent entity type.
    pub parent_type: EntityTypeCode,
    /// Parent instance.
    pub parent_id: EntityId,
    /// Optional relationship classification links must carry.
    pub relation_kind: Option<String>,
}

/// Listing inputs for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityListRequest {
    /// Listed entity type.
    pub entity_type: EntityTypeCode,
    /// Optional parent scope.
    pub parent: Option<ParentContext>,
    /// Optional case-insensitive name search.
    pub search: Option<String>,
    /// Only rows whose active flag is set.
    pub active_only: bool,
    /// Minimum level rows must be accessible at.
    pub min_level: PermissionLevel,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl EntityListRequest {
    /// Creates a first-page, view-level listing request.
    #[must_use]
    pub fn new(entity_type: EntityTypeCode) -> Self {
        Self {
            entity_type,
            parent: None,
            search: None,
            active_only: false,
            min_level: PermissionLevel::View,
            limit: 20,
            offset: 0,
        }
    }
}

/// One page of listed rows with pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityPage {
    /// Rows of this page.
    pub items: Vec<EntityRecord>,
    /// Rows matching the listing across all pages.
    pub total: u64,
    /// Requested page size.
    pub limit: usize,
    /// Requested offset.
    pub offset: usize,
}

/// Composes RBAC predicates, parent scope joins and caller filters into one
/// entity query and reads it.
#[derive(Clone)]
pub struct EntityListService {
    rbac_gate: RbacGate,
    record_reader: Arc<dyn EntityRecordReader>,
}

impl EntityListService {
    /// Creates a listing service.
    #[must_use]
    pub fn new(rbac_gate: RbacGate, record_reader: Arc<dyn EntityRecordReader>) -> Self {
        Self {
            rbac_gate,
            record_reader,
        }
    }

    /// Lists rows the actor may access, with a total count for pagination.
    ///
    /// No access yields an empty page, never an error. The count and data
    /// reads share one query and run concurrently.
    pub async fn list(
        &self,
        actor_id: ActorId,
        request: EntityListRequest,
    ) -> AppResult<EntityPage> {
        if request.limit == 0 || request.limit > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}, got {}",
                request.limit
            )));
        }

        let query = self.build_query(actor_id, &request).await?;
        if query.matches_nothing() {
            debug!(
                actor_id = %actor_id,
                entity_type = %request.entity_type,
                "listing short-circuited: no accessible rows"
            );
            return Ok(EntityPage {
                items: Vec::new(),
                total: 0,
                limit: request.limit,
                offset: request.offset,
            });
        }

        let (total, items) = tokio::try_join!(
            self.record_reader.count_records(&query),
            self.record_reader.list_records(&query)
        )?;

        Ok(EntityPage {
            items,
            total,
            limit: request.limit,
            offset: request.offset,
        })
    }

    /// Builds the composed query for a listing request.
    pub async fn build_query(
        &self,
        actor_id: ActorId,
        request: &EntityListRequest,
    ) -> AppResult<EntityQuery> {
        let alias = QueryAlias::new(ROOT_ALIAS)?;
        let access = self
            .rbac_gate
            .filter_predicate(actor_id, &request.entity_type, request.min_level, &alias)
            .await?;

        let mut query = EntityQuery::new(request.entity_type.clone(), alias.clone())
            .with_predicate(RecordPredicate::Access(access))
            .paginate(request.limit, request.offset);

        if let Some(parent) = &request.parent {
            let mut join = scope_to_parent(
                &request.entity_type,
                &parent.parent_type,
                parent.parent_id,
                &alias,
            )?;
            if let Some(relation_kind) = &parent.relation_kind {
                join = join.with_relation_kind(relation_kind.clone());
            }
            query = query.with_join(join);
        }

        if request.active_only {
            query = query.with_predicate(RecordPredicate::ActiveOnly {
                alias: alias.clone(),
            });
        }

        if let Some(term) = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            query = query.with_predicate(RecordPredicate::NameContains {
                alias,
                term: term.to_owned(),
            });
        }

        query.validate()?;
        Ok(query)
    }
}
