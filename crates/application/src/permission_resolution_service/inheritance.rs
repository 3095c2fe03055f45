use accessgate_domain::PermissionLevel;

/// One-hop parent to child inheritance rule.
///
/// Only direct parents are consulted; access to a grandparent never reaches
/// a grandchild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum InheritanceRule {
    /// Seeing a parent lets the actor see its children.
    ParentView,
    /// Creating under a parent lets the actor create its children.
    ParentCreate,
}

impl InheritanceRule {
    const ALL: [Self; 2] = [Self::ParentView, Self::ParentCreate];

    /// Level the actor must hold on the parent.
    fn threshold(self) -> PermissionLevel {
        match self {
            Self::ParentView => PermissionLevel::View,
            Self::ParentCreate => PermissionLevel::Create,
        }
    }

    /// Level granted on the child.
    fn granted_level(self) -> PermissionLevel {
        match self {
            Self::ParentView => PermissionLevel::View,
            Self::ParentCreate => PermissionLevel::Create,
        }
    }

    /// Level inherited by a child when the actor holds `parent_level` on one
    /// of its parents.
    pub(super) fn inherited_level(parent_level: PermissionLevel) -> Option<PermissionLevel> {
        Self::ALL
            .iter()
            .filter(|rule| parent_level.satisfies(rule.threshold()))
            .map(|rule| rule.granted_level())
            .max()
    }

    /// Lowest parent level that makes inheritance grant at least `min_level`,
    /// or `None` when no rule grants that much.
    pub(super) fn parent_threshold_for(min_level: PermissionLevel) -> Option<PermissionLevel> {
        Self::ALL
            .iter()
            .filter(|rule| rule.granted_level().satisfies(min_level))
            .map(|rule| rule.threshold())
            .min()
    }

    /// Highest level inheritance can grant.
    pub(super) fn ceiling() -> PermissionLevel {
        PermissionLevel::Create
    }
}

#[cfg(test)]
mod tests {
    use accessgate_domain::PermissionLevel;

    use super::InheritanceRule;

    #[test]
    fn inherited_level_is_capped_at_create() {
        assert_eq!(
            InheritanceRule::inherited_level(PermissionLevel::View),
            Some(PermissionLevel::View)
        );
        assert_eq!(
            InheritanceRule::inherited_level(PermissionLevel::Delete),
            Some(PermissionLevel::View)
        );
        assert_eq!(
            InheritanceRule::inherited_level(PermissionLevel::Create),
            Some(PermissionLevel::Create)
        );
        assert_eq!(
            InheritanceRule::inherited_level(PermissionLevel::Owner),
            Some(PermissionLevel::Create)
        );
    }

    #[test]
    fn parent_threshold_depends_on_requested_level() {
        assert_eq!(
            InheritanceRule::parent_threshold_for(PermissionLevel::View),
            Some(PermissionLevel::View)
        );
        assert_eq!(
            InheritanceRule::parent_threshold_for(PermissionLevel::Edit),
            Some(PermissionLevel::Create)
        );
        assert_eq!(
            InheritanceRule::parent_threshold_for(PermissionLevel::Owner),
            None
        );
    }
}
