use super::*;

#[derive(Debug, FromRow)]
struct LinkRow {
    parent_entity_type: String,
    parent_entity_id: Uuid,
    child_entity_type: String,
    child_entity_id: Uuid,
    relation_kind: String,
    active: bool,
}

impl LinkRow {
    fn into_link(self) -> AppResult<RelationshipLink> {
        let context = "failed to decode relationship link row";
        let parent_type = EntityTypeCode::new(self.parent_entity_type)
            .map_err(|error| corrupt_row(context, error))?;
        let child_type = EntityTypeCode::new(self.child_entity_type)
            .map_err(|error| corrupt_row(context, error))?;

        Ok(RelationshipLink::new(
            parent_type,
            EntityId::from_uuid(self.parent_entity_id),
            child_type,
            EntityId::from_uuid(self.child_entity_id),
            self.relation_kind,
        )
        .with_active(self.active))
    }
}

impl PostgresAccessRepository {
    /// Persists one relationship link.
    pub async fn save_link(&self, link: &RelationshipLink) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entity_instance_links (
                parent_entity_type,
                parent_entity_id,
                child_entity_type,
                child_entity_id,
                relation_kind,
                active
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(link.parent_type().as_str())
        .bind(link.parent_id().as_uuid())
        .bind(link.child_type().as_str())
        .bind(link.child_id().as_uuid())
        .bind(link.relation_kind())
        .bind(link.is_active())
        .execute(&self.pool)
        .await
        .map_err(store_unavailable("failed to save relationship link"))?;

        Ok(())
    }
}

#[async_trait]
impl RelationshipStore for PostgresAccessRepository {
    async fn find_active_links(&self, query: &LinkQuery) -> AppResult<Vec<RelationshipLink>> {
        if query.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT parent_entity_type, parent_entity_id, child_entity_type, child_entity_id, \
             relation_kind, active \
             FROM entity_instance_links \
             WHERE active",
        );

        if let Some(parent_types) = &query.parent_types {
            builder.push(" AND parent_entity_type = ANY(");
            builder.push_bind(codes(parent_types));
            builder.push(')');
        }
        if let Some(parent_ids) = &query.parent_ids {
            builder.push(" AND parent_entity_id = ANY(");
            builder.push_bind(uuids(parent_ids, EntityId::as_uuid));
            builder.push(')');
        }
        if let Some(child_type) = &query.child_type {
            builder.push(" AND child_entity_type = ");
            builder.push_bind(child_type.as_str().to_owned());
        }
        if let Some(child_ids) = &query.child_ids {
            builder.push(" AND child_entity_id = ANY(");
            builder.push_bind(uuids(child_ids, EntityId::as_uuid));
            builder.push(')');
        }
        if let Some(relation_kind) = &query.relation_kind {
            builder.push(" AND relation_kind = ");
            builder.push_bind(relation_kind.clone());
        }

        let rows = builder
            .build_query_as::<LinkRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(store_unavailable("failed to load relationship links"))?;

        rows.into_iter().map(LinkRow::into_link).collect()
    }
}
