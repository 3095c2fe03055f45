use accessgate_application::{AccessPredicate, EntityQuery, ParentScopeJoin, RecordPredicate};
use accessgate_core::{AppError, AppResult, EntityId};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Column shape a rendered entity query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection {
    /// Row count across all pages.
    Count,
    /// One page of `id, name, active` rows.
    Rows,
}

/// Renders a composed entity query against `schema`.`entity_type`.
///
/// Identifiers come from validated codes and aliases; every value is bound.
pub(crate) fn build_entity_query(
    schema: &str,
    query: &EntityQuery,
    projection: Projection,
) -> AppResult<QueryBuilder<'static, Postgres>> {
    query.validate()?;
    let alias = query.alias.as_str();

    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT ");
    match projection {
        Projection::Count if query.requires_distinct() => {
            builder.push(format!("COUNT(DISTINCT {alias}.id) AS total"));
        }
        Projection::Count => {
            builder.push("COUNT(*) AS total");
        }
        Projection::Rows => {
            if query.requires_distinct() {
                builder.push("DISTINCT ");
            }
            builder.push(format!("{alias}.id, {alias}.name, {alias}.active"));
        }
    }

    builder.push(" FROM ");
    push_identifier(&mut builder, schema);
    builder.push('.');
    push_identifier(&mut builder, query.entity_type.as_str());
    builder.push(" AS ");
    builder.push(alias);

    for (index, join) in query.joins.iter().enumerate() {
        push_parent_scope_join(&mut builder, join, index);
    }

    builder.push(" WHERE TRUE");
    for predicate in &query.predicates {
        builder.push(" AND ");
        push_record_predicate(&mut builder, predicate);
    }

    if projection == Projection::Rows {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid entity query limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid entity query offset: {error}"))
        })?;

        builder.push(format!(" ORDER BY {alias}.name, {alias}.id"));
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }

    Ok(builder)
}

/// Pushes one RBAC predicate. `MatchAll` and `MatchNone` render as constants.
fn push_access_predicate(
    builder: &mut QueryBuilder<'static, Postgres>,
    predicate: &AccessPredicate,
) {
    match predicate {
        AccessPredicate::MatchAll => {
            builder.push("TRUE");
        }
        AccessPredicate::MatchNone => {
            builder.push("FALSE");
        }
        AccessPredicate::IdIn { alias, ids } => {
            builder.push(alias.as_str());
            builder.push(".id = ANY(");
            builder.push_bind(ids.iter().map(EntityId::as_uuid).collect::<Vec<Uuid>>());
            builder.push(')');
        }
    }
}

/// Pushes an inner join on active links from the scoped parent instance.
fn push_parent_scope_join(
    builder: &mut QueryBuilder<'static, Postgres>,
    join: &ParentScopeJoin,
    index: usize,
) {
    let alias = join.alias.as_str();
    let link_alias = format!("{alias}_parent_{index}");

    builder.push(format!(
        " JOIN entity_instance_links AS {link_alias} ON {link_alias}.child_entity_id = {alias}.id \
         AND {link_alias}.active AND {link_alias}.child_entity_type = "
    ));
    builder.push_bind(join.child_type.as_str().to_owned());
    builder.push(format!(" AND {link_alias}.parent_entity_type = "));
    builder.push_bind(join.parent_type.as_str().to_owned());
    builder.push(format!(" AND {link_alias}.parent_entity_id = "));
    builder.push_bind(join.parent_id.as_uuid());

    if let Some(relation_kind) = &join.relation_kind {
        builder.push(format!(" AND {link_alias}.relation_kind = "));
        builder.push_bind(relation_kind.clone());
    }
}

fn push_record_predicate(
    builder: &mut QueryBuilder<'static, Postgres>,
    predicate: &RecordPredicate,
) {
    match predicate {
        RecordPredicate::Access(access) => push_access_predicate(builder, access),
        RecordPredicate::ActiveOnly { alias } => {
            builder.push(alias.as_str());
            builder.push(".active");
        }
        RecordPredicate::NameContains { alias, term } => {
            builder.push(alias.as_str());
            builder.push(".name ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(term)));
            builder.push(" ESCAPE '\\'");
        }
    }
}

fn push_identifier(builder: &mut QueryBuilder<'static, Postgres>, identifier: &str) {
    builder.push('"');
    builder.push(identifier);
    builder.push('"');
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for character in term.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use accessgate_application::{
        AccessPredicate, EntityQuery, QueryAlias, RecordPredicate, scope_to_parent,
    };
    use accessgate_core::{EntityId, EntityTypeCode};

    use super::{Projection, build_entity_query, escape_like};

    fn alias() -> QueryAlias {
        QueryAlias::new("e").unwrap_or_else(|_| unreachable!())
    }

    fn code(value: &str) -> EntityTypeCode {
        EntityTypeCode::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn rows_query_binds_ids_and_paginates() {
        let query = EntityQuery::new(code("task"), alias())
            .with_predicate(RecordPredicate::Access(AccessPredicate::IdIn {
                alias: alias(),
                ids: BTreeSet::from([EntityId::new_random()]),
            }))
            .paginate(10, 30);

        let builder = build_entity_query("app", &query, Projection::Rows);
        assert!(builder.is_ok());
        let builder = builder.unwrap_or_else(|_| unreachable!());
        assert_eq!(
            builder.sql(),
            "SELECT e.id, e.name, e.active FROM \"app\".\"task\" AS e WHERE TRUE \
             AND e.id = ANY($1) ORDER BY e.name, e.id LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn parent_scope_join_forces_distinct_rows() {
        let project_id = EntityId::new_random();
        let join = scope_to_parent(&code("task"), &code("project"), project_id, &alias())
            .unwrap_or_else(|_| unreachable!())
            .with_relation_kind("contains");
        let query = EntityQuery::new(code("task"), alias())
            .with_predicate(RecordPredicate::Access(AccessPredicate::MatchAll))
            .with_join(join);

        let rows = build_entity_query("app", &query, Projection::Rows)
            .unwrap_or_else(|_| unreachable!());
        assert!(rows.sql().starts_with("SELECT DISTINCT e.id"));
        assert!(rows.sql().contains("JOIN entity_instance_links AS e_parent_0"));
        assert!(rows.sql().contains("e_parent_0.relation_kind = $4"));
        assert!(rows.sql().contains("AND TRUE"));

        let count = build_entity_query("app", &query, Projection::Count)
            .unwrap_or_else(|_| unreachable!());
        assert!(count.sql().starts_with("SELECT COUNT(DISTINCT e.id)"));
        assert!(!count.sql().contains("LIMIT"));
    }

    #[test]
    fn search_term_is_bound_and_escaped() {
        let query = EntityQuery::new(code("task"), alias()).with_predicate(
            RecordPredicate::NameContains {
                alias: alias(),
                term: "50%_off'; --".to_owned(),
            },
        );

        let builder = build_entity_query("app", &query, Projection::Count)
            .unwrap_or_else(|_| unreachable!());
        assert!(builder.sql().contains("e.name ILIKE $1 ESCAPE '\\'"));
        assert!(!builder.sql().contains("off"));
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn match_none_renders_false() {
        let query = EntityQuery::new(code("task"), alias())
            .with_predicate(RecordPredicate::Access(AccessPredicate::MatchNone));

        let builder = build_entity_query("app", &query, Projection::Count)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) AS total FROM \"app\".\"task\" AS e WHERE TRUE AND FALSE"
        );
    }

    #[test]
    fn foreign_alias_is_rejected() {
        let other = QueryAlias::new("other").unwrap_or_else(|_| unreachable!());
        let query = EntityQuery::new(code("task"), alias())
            .with_predicate(RecordPredicate::ActiveOnly { alias: other });

        assert!(build_entity_query("app", &query, Projection::Rows).is_err());
    }
}
