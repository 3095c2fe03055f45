use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use accessgate_core::{ActorId, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::{AccessibleIds, ActorKind, PermissionGrant, PermissionLevel};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::access_ports::{
    EntityTypeCatalog, GrantQuery, LinkQuery, PermissionStore, RelationshipStore,
};

mod accessible_ids;
mod inheritance;
mod max_level;


use inheritance::InheritanceRule;

/// Resolves effective permission levels and accessible instance sets.
///
/// The service holds no permission state between calls: every resolution
/// reads the stores afresh, so grant and membership changes apply on the
/// next call. Link traversal is bounded to one hop (actor to role, parent to
/// child), which keeps resolution terminating even if links form cycles.
#[derive(Clone)]
pub struct PermissionResolutionService {
    permission_store: Arc<dyn PermissionStore>,
    relationship_store: Arc<dyn RelationshipStore>,
    entity_type_catalog: Arc<dyn EntityTypeCatalog>,
}

impl PermissionResolutionService {
    /// Creates a new resolution service from store implementations.
    #[must_use]
    pub fn new(
        permission_store: Arc<dyn PermissionStore>,
        relationship_store: Arc<dyn RelationshipStore>,
        entity_type_catalog: Arc<dyn EntityTypeCatalog>,
    ) -> Self {
        Self {
            permission_store,
            relationship_store,
            entity_type_catalog,
        }
    }

    async fn resolve_grantees(&self, actor_id: ActorId) -> AppResult<Grantees> {
        let memberships = self
            .relationship_store
            .find_active_links(&LinkQuery::role_memberships(actor_id))
            .await?;

        let role_ids: BTreeSet<ActorId> = memberships
            .iter()
            .filter(|link| link.is_active())
            .map(|link| ActorId::from_uuid(link.parent_id().as_uuid()))
            .collect();

        Ok(Grantees {
            actor_id,
            role_ids: role_ids.into_iter().collect(),
        })
    }

    /// Loads direct and group grants of the grantees on one entity type.
    ///
    /// The store is trusted to filter inactive and expired rows, but the
    /// result is filtered again against `now` before aggregation.
    async fn load_grants(
        &self,
        grantees: &Grantees,
        entity_type: &EntityTypeCode,
        scope_ids: Option<Vec<EntityId>>,
        min_level: Option<PermissionLevel>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let direct_query =
            grantees.query(ActorKind::Individual, entity_type, &scope_ids, min_level);
        let group_query = grantees.query(ActorKind::Group, entity_type, &scope_ids, min_level);

        let (direct, group) = tokio::try_join!(
            self.find_grants(&direct_query),
            self.find_grants(&group_query)
        )?;

        Ok(direct
            .into_iter()
            .chain(group)
            .filter(|grant| grant.is_effective_at(now))
            .filter(|grant| min_level.is_none_or(|level| grant.level().satisfies(level)))
            .collect())
    }

    async fn find_grants(&self, query: &GrantQuery) -> AppResult<Vec<PermissionGrant>> {
        if query.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        self.permission_store.find_active_grants(query).await
    }

    async fn find_children(&self, query: LinkQuery) -> AppResult<BTreeSet<EntityId>> {
        if query.is_unsatisfiable() {
            return Ok(BTreeSet::new());
        }

        Ok(self
            .relationship_store
            .find_active_links(&query)
            .await?
            .iter()
            .filter(|link| link.is_active())
            .map(|link| link.child_id())
            .collect())
    }

    async fn parent_types_of(
        &self,
        entity_type: &EntityTypeCode,
    ) -> AppResult<Vec<EntityTypeCode>> {
        let parent_types = self.entity_type_catalog.parent_types_of(entity_type).await?;
        debug!(
            entity_type = %entity_type,
            parent_type_count = parent_types.len(),
            "resolved declared parent types"
        );

        Ok(parent_types.into_iter().collect())
    }
}

/// The actor plus every role the actor currently belongs to.
#[derive(Debug, Clone)]
struct Grantees {
    actor_id: ActorId,
    role_ids: Vec<ActorId>,
}

impl Grantees {
    fn query(
        &self,
        actor_kind: ActorKind,
        entity_type: &EntityTypeCode,
        scope_ids: &Option<Vec<EntityId>>,
        min_level: Option<PermissionLevel>,
    ) -> GrantQuery {
        let actor_ids = match actor_kind {
            ActorKind::Individual => vec![self.actor_id],
            ActorKind::Group => self.role_ids.clone(),
        };

        GrantQuery {
            actor_kind: Some(actor_kind),
            actor_ids: Some(actor_ids),
            entity_type: Some(entity_type.clone()),
            scope_ids: scope_ids.clone(),
            min_level,
        }
    }
}

/// Strongest level held on each parent instance, plus the type-wide level.
#[derive(Debug, Default)]
struct ParentLevels {
    type_level: Option<PermissionLevel>,
    instances: BTreeMap<EntityId, PermissionLevel>,
}

impl ParentLevels {
    fn from_grants(grants: &[PermissionGrant]) -> Self {
        let mut levels = Self::default();
        for grant in grants {
            if grant.is_type_level() {
                levels.type_level = levels.type_level.max(Some(grant.level()));
            } else {
                let entry = levels
                    .instances
                    .entry(grant.scope_id())
                    .or_insert(grant.level());
                *entry = (*entry).max(grant.level());
            }
        }

        levels
    }

    /// Strongest level covering any of `parent_ids`.
    fn strongest_for(&self, parent_ids: &BTreeSet<EntityId>) -> Option<PermissionLevel> {
        parent_ids
            .iter()
            .filter_map(|parent_id| self.instances.get(parent_id).copied())
            .max()
            .max(self.type_level)
    }

    /// Strongest level held anywhere on the parent type.
    fn strongest_anywhere(&self) -> Option<PermissionLevel> {
        self.instances.values().copied().max().max(self.type_level)
    }

    /// Parent instances whose level lets inheritance grant at least `min_level`.
    fn qualifying_instances(&self, min_level: PermissionLevel) -> Vec<EntityId> {
        self.instances
            .iter()
            .filter(|(_, level)| {
                InheritanceRule::inherited_level(**level)
                    .is_some_and(|inherited| inherited.satisfies(min_level))
            })
            .map(|(parent_id, _)| *parent_id)
            .collect()
    }

    /// Whether the type-wide level lets inheritance grant at least `min_level`.
    fn type_level_qualifies(&self, min_level: PermissionLevel) -> bool {
        self.type_level
            .and_then(InheritanceRule::inherited_level)
            .is_some_and(|inherited| inherited.satisfies(min_level))
    }
}

fn summarize(accessible: &AccessibleIds) -> String {
    match accessible {
        AccessibleIds::All => "all".to_owned(),
        AccessibleIds::Only(ids) => ids.len().to_string(),
    }
}
