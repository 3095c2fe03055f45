use std::collections::BTreeSet;
use std::sync::Arc;

use accessgate_application::{
    EntityQuery, EntityRecord, EntityRecordReader, LinkQuery, ParentScopeJoin, RecordPredicate,
    RelationshipStore,
};
use accessgate_core::{AppResult, EntityId};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory reader evaluating composed entity queries.
///
/// Parent scope joins are resolved through a relationship store, so the
/// reader sees the same links the resolution engine does.
pub struct InMemoryEntityRecordReader {
    records: RwLock<Vec<EntityRecord>>,
    relationship_store: Arc<dyn RelationshipStore>,
}

impl InMemoryEntityRecordReader {
    /// Creates an empty reader resolving joins through `relationship_store`.
    #[must_use]
    pub fn new(relationship_store: Arc<dyn RelationshipStore>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            relationship_store,
        }
    }

    /// Stores one entity row.
    pub async fn save_record(&self, record: EntityRecord) {
        self.records.write().await.push(record);
    }

    async fn joined_ids(&self, join: &ParentScopeJoin) -> AppResult<BTreeSet<EntityId>> {
        let mut query =
            LinkQuery::children_of(vec![join.parent_type.clone()], join.child_type.clone())
                .with_parent_ids(vec![join.parent_id]);
        query.relation_kind = join.relation_kind.clone();

        Ok(self
            .relationship_store
            .find_active_links(&query)
            .await?
            .iter()
            .map(|link| link.child_id())
            .collect())
    }

    async fn matching(&self, query: &EntityQuery) -> AppResult<Vec<EntityRecord>> {
        query.validate()?;

        let mut joined: Option<BTreeSet<EntityId>> = None;
        for join in &query.joins {
            let ids = self.joined_ids(join).await?;
            joined = Some(match joined {
                Some(previous) => previous.intersection(&ids).copied().collect(),
                None => ids,
            });
        }

        let records = self.records.read().await;
        let mut matching: Vec<EntityRecord> = records
            .iter()
            .filter(|record| record.entity_type == query.entity_type)
            .filter(|record| joined.as_ref().is_none_or(|ids| ids.contains(&record.id)))
            .filter(|record| {
                query
                    .predicates
                    .iter()
                    .all(|predicate| evaluate(predicate, record))
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.id.cmp(&right.id))
        });
        matching.dedup_by_key(|record| record.id);

        Ok(matching)
    }
}

fn evaluate(predicate: &RecordPredicate, record: &EntityRecord) -> bool {
    match predicate {
        RecordPredicate::Access(access) => access.admits(record.id),
        RecordPredicate::ActiveOnly { .. } => record.active,
        RecordPredicate::NameContains { term, .. } => record
            .name
            .to_lowercase()
            .contains(term.to_lowercase().as_str()),
    }
}

#[async_trait]
impl EntityRecordReader for InMemoryEntityRecordReader {
    async fn count_records(&self, query: &EntityQuery) -> AppResult<u64> {
        Ok(self.matching(query).await?.len() as u64)
    }

    async fn list_records(&self, query: &EntityQuery) -> AppResult<Vec<EntityRecord>> {
        Ok(self
            .matching(query)
            .await?
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accessgate_application::{
        EntityListRequest, EntityListService, EntityRecord, ParentContext,
        PermissionResolutionService, RbacGate,
    };
    use accessgate_core::{ActorId, EntityId, EntityTypeCode};
    use accessgate_domain::{ActorKind, PermissionGrant, PermissionLevel, RelationshipLink};

    use super::InMemoryEntityRecordReader;
    use crate::InMemoryAccessRepository;

    fn code(value: &str) -> EntityTypeCode {
        EntityTypeCode::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn task(name: &str) -> EntityRecord {
        EntityRecord {
            id: EntityId::new_random(),
            entity_type: code("task"),
            name: name.to_owned(),
            active: true,
        }
    }

    #[tokio::test]
    async fn listing_scoped_to_parent_returns_only_its_children() {
        let repository = Arc::new(InMemoryAccessRepository::new());
        let reader = Arc::new(InMemoryEntityRecordReader::new(repository.clone()));
        let actor = ActorId::new_random();
        let first_project = EntityId::new_random();
        let second_project = EntityId::new_random();
        let first_task = task("First");
        let second_task = task("Second");

        reader.save_record(first_task.clone()).await;
        reader.save_record(second_task.clone()).await;
        for (project, child) in [(first_project, &first_task), (second_project, &second_task)] {
            repository
                .save_link(RelationshipLink::new(
                    code("project"),
                    project,
                    code("task"),
                    child.id,
                    "contains",
                ))
                .await;
        }
        // Duplicate link to the same parent must not duplicate the row.
        repository
            .save_link(RelationshipLink::new(
                code("project"),
                first_project,
                code("task"),
                first_task.id,
                "contains",
            ))
            .await;
        repository
            .save_grant(PermissionGrant::new(
                ActorKind::Individual,
                actor,
                code("task"),
                EntityId::ALL,
                PermissionLevel::View,
            ))
            .await;

        let gate = RbacGate::new(PermissionResolutionService::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
        ));
        let service = EntityListService::new(gate, reader);

        let mut request = EntityListRequest::new(code("task"));
        request.parent = Some(ParentContext {
            parent_type: code("project"),
            parent_id: first_project,
            relation_kind: Some("contains".to_owned()),
        });

        let page = service.list(actor, request).await;
        assert!(page.is_ok());
        let page = page.unwrap_or_else(|_| unreachable!());
        assert_eq!(page.total, 1);
        assert_eq!(page.items, vec![first_task]);
    }

    #[tokio::test]
    async fn unknown_relation_kind_scopes_to_nothing() {
        let repository = Arc::new(InMemoryAccessRepository::new());
        let reader = Arc::new(InMemoryEntityRecordReader::new(repository.clone()));
        let actor = ActorId::new_random();
        let project = EntityId::new_random();
        let linked = task("Linked");

        reader.save_record(linked.clone()).await;
        repository
            .save_link(RelationshipLink::new(
                code("project"),
                project,
                code("task"),
                linked.id,
                "contains",
            ))
            .await;
        repository
            .save_grant(PermissionGrant::new(
                ActorKind::Individual,
                actor,
                code("task"),
                linked.id,
                PermissionLevel::Edit,
            ))
            .await;

        let gate = RbacGate::new(PermissionResolutionService::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
        ));
        let service = EntityListService::new(gate, reader);

        let mut request = EntityListRequest::new(code("task"));
        request.parent = Some(ParentContext {
            parent_type: code("project"),
            parent_id: project,
            relation_kind: Some("blocks".to_owned()),
        });

        let page = service.list(actor, request).await;
        assert!(page.is_ok_and(|page| page.items.is_empty() && page.total == 0));
    }
}
