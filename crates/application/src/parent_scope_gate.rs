use accessgate_core::{AppError, AppResult, EntityId, EntityTypeCode};

use crate::query_fragments::{ParentScopeJoin, QueryAlias};

/// Restricts `alias` (rows of `child_type`) to instances linked by an active
/// link from the parent instance `parent_type`/`parent_id`.
///
/// The fragment is structural only and independent of permissions; callers
/// conjoin it with an RBAC predicate.
pub fn scope_to_parent(
    child_type: &EntityTypeCode,
    parent_type: &EntityTypeCode,
    parent_id: EntityId,
    alias: &QueryAlias,
) -> AppResult<ParentScopeJoin> {
    if parent_id.is_all() {
        return Err(AppError::Validation(format!(
            "parent scope for '{child_type}' requires a concrete '{parent_type}' instance"
        )));
    }

    Ok(ParentScopeJoin {
        alias: alias.clone(),
        child_type: child_type.clone(),
        parent_type: parent_type.clone(),
        parent_id,
        relation_kind: None,
    })
}
