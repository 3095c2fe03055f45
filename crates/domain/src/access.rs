use std::collections::BTreeSet;

use accessgate_core::EntityId;
use serde::{Deserialize, Serialize};

/// Instances an actor may access at some minimum level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "ids", rename_all = "snake_case")]
pub enum AccessibleIds {
    /// Every instance of the type; no instance filtering is required.
    All,
    /// Exactly these instances. Empty means no access.
    Only(BTreeSet<EntityId>),
}

impl AccessibleIds {
    /// Returns the empty (no access) result.
    #[must_use]
    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    /// Returns whether `entity_id` is accessible.
    #[must_use]
    pub fn contains(&self, entity_id: EntityId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&entity_id),
        }
    }

    /// Returns whether nothing is accessible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Only(ids) if ids.is_empty())
    }

    /// Returns whether every instance is accessible.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}
