use std::str::FromStr;

use accessgate_core::{ActorId, AppError, EntityId, EntityTypeCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PermissionLevel;

/// Whether a grant targets a person or a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A single person.
    Individual,
    /// A role whose members inherit the grant.
    Group,
}

impl ActorKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
        }
    }
}

impl FromStr for ActorKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "individual" => Ok(Self::Individual),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown actor kind '{value}'"
            ))),
        }
    }
}

/// One (actor, entity type, scope) access assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    actor_kind: ActorKind,
    actor_id: ActorId,
    entity_type: EntityTypeCode,
    scope_id: EntityId,
    level: PermissionLevel,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl PermissionGrant {
    /// Creates an active, non-expiring grant.
    #[must_use]
    pub fn new(
        actor_kind: ActorKind,
        actor_id: ActorId,
        entity_type: EntityTypeCode,
        scope_id: EntityId,
        level: PermissionLevel,
    ) -> Self {
        Self {
            actor_kind,
            actor_id,
            entity_type,
            scope_id,
            level,
            active: true,
            expires_at: None,
        }
    }

    /// Returns the grant with an expiry timestamp.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the grant with the given activation flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the grantee kind.
    #[must_use]
    pub fn actor_kind(&self) -> ActorKind {
        self.actor_kind
    }

    /// Returns the grantee identifier.
    #[must_use]
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Returns the target entity type.
    #[must_use]
    pub fn entity_type(&self) -> &EntityTypeCode {
        &self.entity_type
    }

    /// Returns the instance scope, possibly [`EntityId::ALL`].
    #[must_use]
    pub fn scope_id(&self) -> EntityId {
        self.scope_id
    }

    /// Returns the granted level.
    #[must_use]
    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    /// Returns the activation flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the optional expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns whether the grant covers every instance of its type.
    #[must_use]
    pub fn is_type_level(&self) -> bool {
        self.scope_id.is_all()
    }

    /// Returns whether the grant is active and unexpired at `now`.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Returns whether the grant applies to `target`.
    ///
    /// A type-level grant covers every target. An instance grant covers only
    /// an equal identifier, so it never satisfies a type-level target.
    #[must_use]
    pub fn covers(&self, target: EntityId) -> bool {
        self.is_type_level() || self.scope_id == target
    }

    /// Returns the strongest level among `grants` that are effective at `now`
    /// and cover `target`.
    #[must_use]
    pub fn strongest_covering<'a>(
        grants: impl IntoIterator<Item = &'a PermissionGrant>,
        target: EntityId,
        now: DateTime<Utc>,
    ) -> Option<PermissionLevel> {
        grants
            .into_iter()
            .filter(|grant| grant.is_effective_at(now) && grant.covers(target))
            .map(PermissionGrant::level)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use accessgate_core::{ActorId, EntityId, EntityTypeCode};
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    use super::{ActorKind, PermissionGrant};
    use crate::PermissionLevel;

    fn project() -> EntityTypeCode {
        EntityTypeCode::new("project").unwrap_or_else(|_| unreachable!())
    }

    fn grant(scope_id: EntityId, level: PermissionLevel) -> PermissionGrant {
        PermissionGrant::new(
            ActorKind::Individual,
            ActorId::new_random(),
            project(),
            scope_id,
            level,
        )
    }

    #[test]
    fn expired_and_inactive_grants_are_inert() {
        let now = Utc::now();
        let target = EntityId::new_random();
        let expired = grant(target, PermissionLevel::Owner).with_expiry(now - Duration::minutes(1));
        let inactive = grant(target, PermissionLevel::Owner).with_active(false);
        let future = grant(target, PermissionLevel::Edit).with_expiry(now + Duration::hours(1));

        let resolved =
            PermissionGrant::strongest_covering([&expired, &inactive, &future], target, now);
        assert_eq!(resolved, Some(PermissionLevel::Edit));
    }

    #[test]
    fn instance_grants_do_not_cover_type_level_targets() {
        let instance = grant(EntityId::new_random(), PermissionLevel::Owner);
        assert!(!instance.covers(EntityId::ALL));

        let type_level = grant(EntityId::ALL, PermissionLevel::Create);
        assert!(type_level.covers(EntityId::ALL));
        assert!(type_level.covers(EntityId::new_random()));
    }

    fn any_level() -> impl Strategy<Value = PermissionLevel> {
        prop::sample::select(PermissionLevel::all().to_vec())
    }

    proptest! {
        #[test]
        fn adding_a_grant_never_lowers_the_strongest_level(
            existing in prop::collection::vec((any::<bool>(), any_level()), 0..8),
            added_level in any_level(),
            added_is_type_level in any::<bool>(),
        ) {
            let now = Utc::now();
            let target = EntityId::new_random();
            let mut grants: Vec<PermissionGrant> = existing
                .into_iter()
                .map(|(type_level, level)| {
                    let scope = if type_level { EntityId::ALL } else { target };
                    grant(scope, level)
                })
                .collect();
            let before = PermissionGrant::strongest_covering(&grants, target, now);

            let scope = if added_is_type_level { EntityId::ALL } else { target };
            grants.push(grant(scope, added_level));
            let after = PermissionGrant::strongest_covering(&grants, target, now);

            prop_assert!(after >= before);
            prop_assert!(after >= Some(added_level));
        }
    }
}
