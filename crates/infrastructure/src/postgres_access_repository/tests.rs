use std::collections::BTreeSet;
use std::sync::Arc;

use accessgate_application::{
    EntityTypeCatalog, GrantQuery, LinkQuery, PermissionResolutionService, PermissionStore,
    RelationshipStore,
};
use accessgate_core::{ActorId, EntityId, EntityTypeCode};
use accessgate_domain::{
    ActorKind, EntityTypeDeclaration, PermissionGrant, PermissionLevel, RelationshipLink,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresAccessRepository;
use crate::MIGRATOR;

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

fn unique_code(prefix: &str) -> EntityTypeCode {
    EntityTypeCode::new(format!("{prefix}_{}", Uuid::new_v4().simple()))
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn grant_lookup_filters_expired_and_inactive_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool);
    let actor = ActorId::new_random();
    let project = unique_code("project");
    let target = EntityId::new_random();

    let grants = [
        PermissionGrant::new(
            ActorKind::Individual,
            actor,
            project.clone(),
            target,
            PermissionLevel::Edit,
        ),
        PermissionGrant::new(
            ActorKind::Individual,
            actor,
            project.clone(),
            EntityId::ALL,
            PermissionLevel::Owner,
        )
        .with_expiry(Utc::now() - Duration::hours(1)),
        PermissionGrant::new(
            ActorKind::Individual,
            actor,
            project.clone(),
            target,
            PermissionLevel::Delete,
        )
        .with_active(false),
    ];
    for grant in &grants {
        assert!(repository.save_grant(grant).await.is_ok());
    }

    let query = GrantQuery::for_actors(ActorKind::Individual, vec![actor])
        .on_type(project.clone())
        .scoped_to(vec![EntityId::ALL, target]);
    let found = repository.find_active_grants(&query).await;
    assert!(found.is_ok());
    let found = found.unwrap_or_else(|_| unreachable!());
    assert_eq!(found, vec![grants[0].clone()]);

    let above_edit = repository
        .find_active_grants(&query.clone().at_least(PermissionLevel::Share))
        .await;
    assert!(above_edit.is_ok_and(|grants| grants.is_empty()));

    let no_roles = repository
        .find_active_grants(&GrantQuery::for_actors(ActorKind::Group, Vec::new()))
        .await;
    assert!(no_roles.is_ok_and(|grants| grants.is_empty()));
}

#[tokio::test]
async fn link_lookup_ignores_inactive_links() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool);
    let business = unique_code("business");
    let project = unique_code("project");
    let parent = EntityId::new_random();
    let active_child = EntityId::new_random();
    let inactive_child = EntityId::new_random();

    let active = RelationshipLink::new(
        business.clone(),
        parent,
        project.clone(),
        active_child,
        "contains",
    );
    let inactive = RelationshipLink::new(
        business.clone(),
        parent,
        project.clone(),
        inactive_child,
        "contains",
    )
    .with_active(false);
    assert!(repository.save_link(&active).await.is_ok());
    assert!(repository.save_link(&inactive).await.is_ok());

    let found = repository
        .find_active_links(
            &LinkQuery::children_of(vec![business], project).with_parent_ids(vec![parent]),
        )
        .await;
    assert_eq!(found.ok(), Some(vec![active]));
}

#[tokio::test]
async fn catalog_reports_declaring_parent_types() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool);
    let business = unique_code("business");
    let portfolio = unique_code("portfolio");
    let project = unique_code("project");

    for declaration in [
        EntityTypeDeclaration::new(business.clone(), [project.clone()]),
        EntityTypeDeclaration::new(portfolio.clone(), [project.clone()]),
        EntityTypeDeclaration::new(project.clone(), Vec::new()),
    ] {
        assert!(repository.save_entity_type(&declaration).await.is_ok());
    }

    let parents = repository.parent_types_of(&project).await;
    assert_eq!(parents.ok(), Some(BTreeSet::from([business, portfolio])));
}

#[tokio::test]
async fn resolution_service_runs_against_postgres_stores() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = Arc::new(PostgresAccessRepository::new(pool));
    let service = PermissionResolutionService::new(
        repository.clone(),
        repository.clone(),
        repository.clone(),
    );

    let actor = ActorId::new_random();
    let role = ActorId::new_random();
    let business = unique_code("business");
    let project = unique_code("project");
    let business_id = EntityId::new_random();
    let project_id = EntityId::new_random();

    assert!(
        repository
            .save_entity_type(&EntityTypeDeclaration::new(
                business.clone(),
                [project.clone()]
            ))
            .await
            .is_ok()
    );
    assert!(
        repository
            .save_link(&RelationshipLink::role_membership(role, actor))
            .await
            .is_ok()
    );
    assert!(
        repository
            .save_link(&RelationshipLink::new(
                business.clone(),
                business_id,
                project.clone(),
                project_id,
                "contains",
            ))
            .await
            .is_ok()
    );
    assert!(
        repository
            .save_grant(&PermissionGrant::new(
                ActorKind::Group,
                role,
                business,
                business_id,
                PermissionLevel::Owner,
            ))
            .await
            .is_ok()
    );

    let level = service.max_level(actor, &project, project_id).await;
    assert_eq!(level.ok().flatten(), Some(PermissionLevel::Create));

    let accessible = service
        .accessible_ids(actor, &project, PermissionLevel::View)
        .await;
    assert!(accessible.is_ok_and(|accessible| accessible.contains(project_id)));
}
