use std::collections::BTreeSet;

use accessgate_core::{ActorId, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::{ActorKind, PermissionGrant, PermissionLevel, RelationshipLink};
use async_trait::async_trait;

/// Lookup criteria for permission grants.
///
/// `None` leaves a dimension unconstrained. `Some` of an empty list matches
/// nothing, so an actor without roles never widens into "any group".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrantQuery {
    /// Grantee kind.
    pub actor_kind: Option<ActorKind>,
    /// Grantee identifiers.
    pub actor_ids: Option<Vec<ActorId>>,
    /// Target entity type.
    pub entity_type: Option<EntityTypeCode>,
    /// Accepted scopes, including [`EntityId::ALL`] for type-level grants.
    pub scope_ids: Option<Vec<EntityId>>,
    /// Lowest level returned.
    pub min_level: Option<PermissionLevel>,
}

impl GrantQuery {
    /// Starts a query for grants held by `actor_ids` of one kind.
    #[must_use]
    pub fn for_actors(actor_kind: ActorKind, actor_ids: Vec<ActorId>) -> Self {
        Self {
            actor_kind: Some(actor_kind),
            actor_ids: Some(actor_ids),
            ..Self::default()
        }
    }

    /// Restricts the query to one entity type.
    #[must_use]
    pub fn on_type(mut self, entity_type: EntityTypeCode) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    /// Restricts the query to the given scopes.
    #[must_use]
    pub fn scoped_to(mut self, scope_ids: Vec<EntityId>) -> Self {
        self.scope_ids = Some(scope_ids);
        self
    }

    /// Restricts the query to grants at or above `level`.
    #[must_use]
    pub fn at_least(mut self, level: PermissionLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Returns whether the query can only produce an empty result.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.actor_ids.as_ref().is_some_and(Vec::is_empty)
            || self.scope_ids.as_ref().is_some_and(Vec::is_empty)
    }

    /// Returns whether `grant` satisfies every constrained dimension.
    ///
    /// Activation and expiry are not part of the criteria.
    #[must_use]
    pub fn matches(&self, grant: &PermissionGrant) -> bool {
        self.actor_kind
            .is_none_or(|actor_kind| grant.actor_kind() == actor_kind)
            && self
                .actor_ids
                .as_ref()
                .is_none_or(|actor_ids| actor_ids.contains(&grant.actor_id()))
            && self
                .entity_type
                .as_ref()
                .is_none_or(|entity_type| grant.entity_type() == entity_type)
            && self
                .scope_ids
                .as_ref()
                .is_none_or(|scope_ids| scope_ids.contains(&grant.scope_id()))
            && self
                .min_level
                .is_none_or(|min_level| grant.level().satisfies(min_level))
    }
}

/// Lookup criteria for relationship links, with the same `None`/empty
/// conventions as [`GrantQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkQuery {
    /// Accepted parent types.
    pub parent_types: Option<Vec<EntityTypeCode>>,
    /// Accepted parent instances.
    pub parent_ids: Option<Vec<EntityId>>,
    /// Child type.
    pub child_type: Option<EntityTypeCode>,
    /// Accepted child instances.
    pub child_ids: Option<Vec<EntityId>>,
    /// Relationship classification.
    pub relation_kind: Option<String>,
}

impl LinkQuery {
    /// Query for the roles `actor_id` is an active member of.
    #[must_use]
    pub fn role_memberships(actor_id: ActorId) -> Self {
        Self {
            parent_types: Some(vec![EntityTypeCode::role()]),
            child_type: Some(EntityTypeCode::individual()),
            child_ids: Some(vec![EntityId::from_uuid(actor_id.as_uuid())]),
            ..Self::default()
        }
    }

    /// Query for links from parents of the given types to children of
    /// `child_type`.
    #[must_use]
    pub fn children_of(parent_types: Vec<EntityTypeCode>, child_type: EntityTypeCode) -> Self {
        Self {
            parent_types: Some(parent_types),
            child_type: Some(child_type),
            ..Self::default()
        }
    }

    /// Restricts the query to the given parent instances.
    #[must_use]
    pub fn with_parent_ids(mut self, parent_ids: Vec<EntityId>) -> Self {
        self.parent_ids = Some(parent_ids);
        self
    }

    /// Restricts the query to the given child instances.
    #[must_use]
    pub fn with_child_ids(mut self, child_ids: Vec<EntityId>) -> Self {
        self.child_ids = Some(child_ids);
        self
    }

    /// Returns whether the query can only produce an empty result.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.parent_types.as_ref().is_some_and(Vec::is_empty)
            || self.parent_ids.as_ref().is_some_and(Vec::is_empty)
            || self.child_ids.as_ref().is_some_and(Vec::is_empty)
    }

    /// Returns whether `link` satisfies every constrained dimension.
    ///
    /// Activation is not part of the criteria.
    #[must_use]
    pub fn matches(&self, link: &RelationshipLink) -> bool {
        self.parent_types
            .as_ref()
            .is_none_or(|parent_types| parent_types.contains(link.parent_type()))
            && self
                .parent_ids
                .as_ref()
                .is_none_or(|parent_ids| parent_ids.contains(&link.parent_id()))
            && self
                .child_type
                .as_ref()
                .is_none_or(|child_type| link.child_type() == child_type)
            && self
                .child_ids
                .as_ref()
                .is_none_or(|child_ids| child_ids.contains(&link.child_id()))
            && self
                .relation_kind
                .as_deref()
                .is_none_or(|relation_kind| link.relation_kind() == relation_kind)
    }
}

/// Repository port for permission grants.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Lists active, unexpired grants matching `query`.
    async fn find_active_grants(&self, query: &GrantQuery) -> AppResult<Vec<PermissionGrant>>;
}

/// Repository port for parent to child relationship links.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Lists active links matching `query`.
    async fn find_active_links(&self, query: &LinkQuery) -> AppResult<Vec<RelationshipLink>>;
}

/// Catalog port answering parent/child type declarations.
#[async_trait]
pub trait EntityTypeCatalog: Send + Sync {
    /// Returns every entity type that declares `child_type` as a child.
    async fn parent_types_of(
        &self,
        child_type: &EntityTypeCode,
    ) -> AppResult<BTreeSet<EntityTypeCode>>;
}
