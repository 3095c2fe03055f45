use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use accessgate_core::{ActorId, AppError, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::{
    ActorKind, EntityTypeDeclaration, PermissionGrant, PermissionLevel, RelationshipLink,
};
use async_trait::async_trait;

use crate::{
    EntityTypeCatalog, GrantQuery, LinkQuery, PermissionResolutionService, PermissionStore,
    RbacGate, RelationshipStore,
};

/// Store fake that returns every matching row, including inactive and
/// expired ones, so tests observe the service's own filtering.
#[derive(Default)]
pub(crate) struct FakeAccessStore {
    grants: Vec<PermissionGrant>,
    links: Vec<RelationshipLink>,
    declarations: Vec<EntityTypeDeclaration>,
    unavailable: bool,
    pub(crate) grant_calls: AtomicUsize,
    pub(crate) link_calls: AtomicUsize,
    pub(crate) catalog_calls: AtomicUsize,
}

impl FakeAccessStore {
    pub(crate) fn with_grant(mut self, grant: PermissionGrant) -> Self {
        self.grants.push(grant);
        self
    }

    pub(crate) fn with_link(mut self, link: RelationshipLink) -> Self {
        self.links.push(link);
        self
    }

    pub(crate) fn with_declaration(mut self, parent: &str, children: &[&str]) -> Self {
        self.declarations.push(EntityTypeDeclaration::new(
            code(parent),
            children.iter().map(|child| code(child)),
        ));
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub(crate) fn into_resolution_service(self) -> (Arc<Self>, PermissionResolutionService) {
        let store = Arc::new(self);
        let service = PermissionResolutionService::new(store.clone(), store.clone(), store.clone());
        (store, service)
    }

    pub(crate) fn into_gate(self) -> (Arc<Self>, RbacGate) {
        let (store, service) = self.into_resolution_service();
        (store, RbacGate::new(service))
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::Unavailable("fake store is offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for FakeAccessStore {
    async fn find_active_grants(&self, query: &GrantQuery) -> AppResult<Vec<PermissionGrant>> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .grants
            .iter()
            .filter(|grant| query.matches(grant))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RelationshipStore for FakeAccessStore {
    async fn find_active_links(&self, query: &LinkQuery) -> AppResult<Vec<RelationshipLink>> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .links
            .iter()
            .filter(|link| query.matches(link))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntityTypeCatalog for FakeAccessStore {
    async fn parent_types_of(
        &self,
        child_type: &EntityTypeCode,
    ) -> AppResult<BTreeSet<EntityTypeCode>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .declarations
            .iter()
            .filter(|declaration| declaration.declares_child(child_type))
            .map(|declaration| declaration.code().clone())
            .collect())
    }
}

pub(crate) fn code(value: &str) -> EntityTypeCode {
    EntityTypeCode::new(value).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn direct_grant(
    actor_id: ActorId,
    entity_type: &str,
    scope_id: EntityId,
    level: PermissionLevel,
) -> PermissionGrant {
    PermissionGrant::new(
        ActorKind::Individual,
        actor_id,
        code(entity_type),
        scope_id,
        level,
    )
}

pub(crate) fn role_grant(
    role_id: ActorId,
    entity_type: &str,
    scope_id: EntityId,
    level: PermissionLevel,
) -> PermissionGrant {
    PermissionGrant::new(ActorKind::Group, role_id, code(entity_type), scope_id, level)
}

pub(crate) fn child_link(
    parent_type: &str,
    parent_id: EntityId,
    child_type: &str,
    child_id: EntityId,
) -> RelationshipLink {
    RelationshipLink::new(
        code(parent_type),
        parent_id,
        code(child_type),
        child_id,
        "contains",
    )
}
