use super::*;

#[derive(Debug, FromRow)]
struct ParentTypeRow {
    code: String,
}

impl PostgresAccessRepository {
    /// Inserts or replaces the child declarations of one entity type.
    pub async fn save_entity_type(&self, declaration: &EntityTypeDeclaration) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entity_types (code, child_type_codes)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE
            SET child_type_codes = EXCLUDED.child_type_codes,
                active = TRUE,
                updated_at = now()
            "#,
        )
        .bind(declaration.code().as_str())
        .bind(
            declaration
                .declared_child_types()
                .iter()
                .map(|child_type| child_type.as_str().to_owned())
                .collect::<Vec<_>>(),
        )
        .execute(&self.pool)
        .await
        .map_err(store_unavailable("failed to save entity type declaration"))?;

        Ok(())
    }
}

#[async_trait]
impl EntityTypeCatalog for PostgresAccessRepository {
    async fn parent_types_of(
        &self,
        child_type: &EntityTypeCode,
    ) -> AppResult<BTreeSet<EntityTypeCode>> {
        let rows = sqlx::query_as::<_, ParentTypeRow>(
            r#"
            SELECT code
            FROM entity_types
            WHERE active AND $1 = ANY(child_type_codes)
            ORDER BY code
            "#,
        )
        .bind(child_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("failed to load parent entity types"))?;

        rows.into_iter()
            .map(|row| {
                EntityTypeCode::new(row.code)
                    .map_err(|error| corrupt_row("failed to decode entity type code", error))
            })
            .collect()
    }
}
