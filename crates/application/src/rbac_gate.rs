use accessgate_core::{ActorId, AppError, AppResult, EntityId, EntityTypeCode};
use accessgate_domain::{AccessOperation, AccessibleIds, PermissionLevel};
use tracing::warn;

use crate::PermissionResolutionService;
use crate::query_fragments::{AccessPredicate, QueryAlias};


/// Permission gate for listing, single-record checks and mutation enforcement.
///
/// Read paths degrade to empty results; only the `enforce_*` calls fail on
/// insufficient access.
#[derive(Clone)]
pub struct RbacGate {
    resolution_service: PermissionResolutionService,
}

impl RbacGate {
    /// Creates a gate over a resolution service.
    #[must_use]
    pub fn new(resolution_service: PermissionResolutionService) -> Self {
        Self { resolution_service }
    }

    /// Returns the underlying resolution service.
    #[must_use]
    pub fn resolution_service(&self) -> &PermissionResolutionService {
        &self.resolution_service
    }

    /// Builds the row filter restricting `alias` to instances the actor may
    /// access at `min_level`.
    pub async fn filter_predicate(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        min_level: PermissionLevel,
        alias: &QueryAlias,
    ) -> AppResult<AccessPredicate> {
        let accessible = self
            .resolution_service
            .accessible_ids(actor_id, entity_type, min_level)
            .await?;

        Ok(match accessible {
            AccessibleIds::All => AccessPredicate::MatchAll,
            AccessibleIds::Only(ids) if ids.is_empty() => AccessPredicate::MatchNone,
            AccessibleIds::Only(ids) => AccessPredicate::IdIn {
                alias: alias.clone(),
                ids,
            },
        })
    }

    /// Returns whether the actor may access one instance at `min_level`.
    pub async fn check_one(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
        min_level: PermissionLevel,
    ) -> AppResult<bool> {
        Ok(self
            .resolution_service
            .accessible_ids(actor_id, entity_type, min_level)
            .await?
            .contains(entity_id))
    }

    /// Ensures the actor may create records of `entity_type`.
    pub async fn enforce_create(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
    ) -> AppResult<PermissionLevel> {
        self.enforce(actor_id, AccessOperation::Create, entity_type, None)
            .await
    }

    /// Ensures the actor may update one record.
    pub async fn enforce_update(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
    ) -> AppResult<PermissionLevel> {
        self.enforce(
            actor_id,
            AccessOperation::Update,
            entity_type,
            Some(entity_id),
        )
        .await
    }

    /// Ensures the actor may delete one record.
    pub async fn enforce_delete(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
    ) -> AppResult<PermissionLevel> {
        self.enforce(
            actor_id,
            AccessOperation::Delete,
            entity_type,
            Some(entity_id),
        )
        .await
    }

    /// Ensures the actor may read one record, for reads that must fail
    /// rather than return nothing.
    pub async fn enforce_view(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
    ) -> AppResult<PermissionLevel> {
        self.enforce(actor_id, AccessOperation::View, entity_type, Some(entity_id))
            .await
    }

    /// Ensures the actor holds the level `operation` requires and returns the
    /// resolved level.
    ///
    /// Type-level operations are checked against [`EntityId::ALL`]; every
    /// other operation needs a concrete instance.
    pub async fn enforce(
        &self,
        actor_id: ActorId,
        operation: AccessOperation,
        entity_type: &EntityTypeCode,
        entity_id: Option<EntityId>,
    ) -> AppResult<PermissionLevel> {
        let target = if operation.is_type_level() {
            EntityId::ALL
        } else {
            entity_id
                .filter(|entity_id| !entity_id.is_all())
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "operation '{}' on '{}' requires a concrete instance",
                        operation.as_str(),
                        entity_type
                    ))
                })?
        };

        let required = operation.required_level();
        let resolved = self
            .resolution_service
            .max_level(actor_id, entity_type, target)
            .await?;

        match resolved {
            Some(level) if level.satisfies(required) => Ok(level),
            _ => {
                warn!(
                    actor_id = %actor_id,
                    operation = operation.as_str(),
                    entity_type = %entity_type,
                    entity_id = %target,
                    required_level = required.value(),
                    resolved_level = PermissionLevel::value_or_no_access(resolved),
                    "access denied"
                );
                Err(AppError::AccessDenied(format!(
                    "actor '{actor_id}' requires '{}' on {entity_type} '{target}' to {}",
                    required.as_str(),
                    operation.as_str()
                )))
            }
        }
    }
}
