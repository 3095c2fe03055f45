use std::collections::BTreeSet;

use accessgate_core::EntityTypeCode;
use serde::{Deserialize, Serialize};

/// Catalog entry describing which types an entity type declares as children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDeclaration {
    code: EntityTypeCode,
    declared_child_types: BTreeSet<EntityTypeCode>,
}

impl EntityTypeDeclaration {
    /// Creates a declaration.
    #[must_use]
    pub fn new(
        code: EntityTypeCode,
        declared_child_types: impl IntoIterator<Item = EntityTypeCode>,
    ) -> Self {
        Self {
            code,
            declared_child_types: declared_child_types.into_iter().collect(),
        }
    }

    /// Returns the declared entity type code.
    #[must_use]
    pub fn code(&self) -> &EntityTypeCode {
        &self.code
    }

    /// Returns the declared child types.
    #[must_use]
    pub fn declared_child_types(&self) -> &BTreeSet<EntityTypeCode> {
        &self.declared_child_types
    }

    /// Returns whether `child_type` is declared as a child of this type.
    #[must_use]
    pub fn declares_child(&self, child_type: &EntityTypeCode) -> bool {
        self.declared_child_types.contains(child_type)
    }
}
