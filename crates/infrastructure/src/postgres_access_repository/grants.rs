use super::*;

#[derive(Debug, FromRow)]
struct GrantRow {
    actor_kind: String,
    actor_id: Uuid,
    entity_type: String,
    scope_id: Uuid,
    level: i16,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<PermissionGrant> {
        let context = "failed to decode permission grant row";
        let actor_kind = ActorKind::from_str(self.actor_kind.as_str())
            .map_err(|error| corrupt_row(context, error))?;
        let entity_type =
            EntityTypeCode::new(self.entity_type).map_err(|error| corrupt_row(context, error))?;
        let level =
            PermissionLevel::from_value(self.level).map_err(|error| corrupt_row(context, error))?;

        let grant = PermissionGrant::new(
            actor_kind,
            ActorId::from_uuid(self.actor_id),
            entity_type,
            EntityId::from_uuid(self.scope_id),
            level,
        )
        .with_active(self.active);

        Ok(match self.expires_at {
            Some(expires_at) => grant.with_expiry(expires_at),
            None => grant,
        })
    }
}

impl PostgresAccessRepository {
    /// Persists one grant.
    pub async fn save_grant(&self, grant: &PermissionGrant) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_grants (
                actor_kind, actor_id, entity_type, scope_id, level, active, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(grant.actor_kind().as_str())
        .bind(grant.actor_id().as_uuid())
        .bind(grant.entity_type().as_str())
        .bind(grant.scope_id().as_uuid())
        .bind(grant.level().value())
        .bind(grant.is_active())
        .bind(grant.expires_at())
        .execute(&self.pool)
        .await
        .map_err(store_unavailable("failed to save permission grant"))?;

        Ok(())
    }
}

#[async_trait]
impl PermissionStore for PostgresAccessRepository {
    async fn find_active_grants(&self, query: &GrantQuery) -> AppResult<Vec<PermissionGrant>> {
        if query.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT actor_kind, actor_id, entity_type, scope_id, level, active, expires_at \
             FROM permission_grants \
             WHERE active AND (expires_at IS NULL OR expires_at > now())",
        );

        if let Some(actor_kind) = query.actor_kind {
            builder.push(" AND actor_kind = ");
            builder.push_bind(actor_kind.as_str());
        }
        if let Some(actor_ids) = &query.actor_ids {
            builder.push(" AND actor_id = ANY(");
            builder.push_bind(uuids(actor_ids, ActorId::as_uuid));
            builder.push(')');
        }
        if let Some(entity_type) = &query.entity_type {
            builder.push(" AND entity_type = ");
            builder.push_bind(entity_type.as_str().to_owned());
        }
        if let Some(scope_ids) = &query.scope_ids {
            builder.push(" AND scope_id = ANY(");
            builder.push_bind(uuids(scope_ids, EntityId::as_uuid));
            builder.push(')');
        }
        if let Some(min_level) = query.min_level {
            builder.push(" AND level >= ");
            builder.push_bind(min_level.value());
        }

        let rows = builder
            .build_query_as::<GrantRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(store_unavailable("failed to load permission grants"))?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }
}
