use accessgate_core::{ActorId, EntityId, EntityTypeCode};
use serde::{Deserialize, Serialize};

/// Directed parent to child association between two entity instances.
///
/// Links are many-to-many and carry no referential integrity. Role
/// membership is a link from a `role` instance to an `individual` instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipLink {
    parent_type: EntityTypeCode,
    parent_id: EntityId,
    child_type: EntityTypeCode,
    child_id: EntityId,
    relation_kind: String,
    active: bool,
}

impl RelationshipLink {
    /// Creates an active link.
    #[must_use]
    pub fn new(
        parent_type: EntityTypeCode,
        parent_id: EntityId,
        child_type: EntityTypeCode,
        child_id: EntityId,
        relation_kind: impl Into<String>,
    ) -> Self {
        Self {
            parent_type,
            parent_id,
            child_type,
            child_id,
            relation_kind: relation_kind.into(),
            active: true,
        }
    }

    /// Creates an active role membership link for `member`.
    #[must_use]
    pub fn role_membership(role_id: ActorId, member: ActorId) -> Self {
        Self::new(
            EntityTypeCode::role(),
            EntityId::from_uuid(role_id.as_uuid()),
            EntityTypeCode::individual(),
            EntityId::from_uuid(member.as_uuid()),
            "member",
        )
    }

    /// Returns the link with the given activation flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the parent entity type.
    #[must_use]
    pub fn parent_type(&self) -> &EntityTypeCode {
        &self.parent_type
    }

    /// Returns the parent instance.
    #[must_use]
    pub fn parent_id(&self) -> EntityId {
        self.parent_id
    }

    /// Returns the child entity type.
    #[must_use]
    pub fn child_type(&self) -> &EntityTypeCode {
        &self.child_type
    }

    /// Returns the child instance.
    #[must_use]
    pub fn child_id(&self) -> EntityId {
        self.child_id
    }

    /// Returns the free-form relationship classification.
    #[must_use]
    pub fn relation_kind(&self) -> &str {
        self.relation_kind.as_str()
    }

    /// Returns the activation flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}
