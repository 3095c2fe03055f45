use std::collections::{BTreeMap, BTreeSet};

use accessgate_application::{
    EntityTypeCatalog, GrantQuery, LinkQuery, PermissionStore, RelationshipStore,
};
use accessgate_core::{AppResult, EntityTypeCode};
use accessgate_domain::{EntityTypeDeclaration, PermissionGrant, RelationshipLink};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;


/// In-memory permission store, relationship store and entity type catalog.
///
/// Applies the same activation and expiry filtering as the PostgreSQL
/// adapter.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    grants: RwLock<Vec<PermissionGrant>>,
    links: RwLock<Vec<RelationshipLink>>,
    entity_types: RwLock<BTreeMap<EntityTypeCode, EntityTypeDeclaration>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one grant.
    pub async fn save_grant(&self, grant: PermissionGrant) {
        self.grants.write().await.push(grant);
    }

    /// Stores one relationship link.
    pub async fn save_link(&self, link: RelationshipLink) {
        self.links.write().await.push(link);
    }

    /// Inserts or replaces the child declarations of one entity type.
    pub async fn save_entity_type(&self, declaration: EntityTypeDeclaration) {
        self.entity_types
            .write()
            .await
            .insert(declaration.code().clone(), declaration);
    }
}

#[async_trait]
impl PermissionStore for InMemoryAccessRepository {
    async fn find_active_grants(&self, query: &GrantQuery) -> AppResult<Vec<PermissionGrant>> {
        let now = Utc::now();
        let grants = self.grants.read().await;

        Ok(grants
            .iter()
            .filter(|grant| grant.is_effective_at(now) && query.matches(grant))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RelationshipStore for InMemoryAccessRepository {
    async fn find_active_links(&self, query: &LinkQuery) -> AppResult<Vec<RelationshipLink>> {
        let links = self.links.read().await;

        Ok(links
            .iter()
            .filter(|link| link.is_active() && query.matches(link))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntityTypeCatalog for InMemoryAccessRepository {
    async fn parent_types_of(
        &self,
        child_type: &EntityTypeCode,
    ) -> AppResult<BTreeSet<EntityTypeCode>> {
        let entity_types = self.entity_types.read().await;

        Ok(entity_types
            .values()
            .filter(|declaration| declaration.declares_child(child_type))
            .map(|declaration| declaration.code().clone())
            .collect())
    }
}
