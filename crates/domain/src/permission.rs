use std::str::FromStr;

use accessgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Level reported when no grant source matched.
///
/// Part of the public contract: callers comparing raw integers rely on it.
pub const NO_ACCESS_LEVEL: i16 = -1;

/// Hierarchical permission level. A higher level subsumes every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Read a record.
    View,
    /// Modify a record.
    Edit,
    /// Share a record with other actors.
    Share,
    /// Delete a record.
    Delete,
    /// Create records of a type. Meaningful at type level.
    Create,
    /// Full control.
    Owner,
}

impl PermissionLevel {
    /// Returns the stable integer storage value.
    #[must_use]
    pub fn value(self) -> i16 {
        match self {
            Self::View => 0,
            Self::Edit => 1,
            Self::Share => 2,
            Self::Delete => 3,
            Self::Create => 4,
            Self::Owner => 5,
        }
    }

    /// Decodes an integer storage value.
    pub fn from_value(value: i16) -> Result<Self, AppError> {
        match value {
            0 => Ok(Self::View),
            1 => Ok(Self::Edit),
            2 => Ok(Self::Share),
            3 => Ok(Self::Delete),
            4 => Ok(Self::Create),
            5 => Ok(Self::Owner),
            _ => Err(AppError::Validation(format!(
                "permission level must be between 0 and 5, got {value}"
            ))),
        }
    }

    /// Returns the stable name of this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Share => "share",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Owner => "owner",
        }
    }

    /// Returns every level ordered from lowest to highest.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionLevel] = &[
            PermissionLevel::View,
            PermissionLevel::Edit,
            PermissionLevel::Share,
            PermissionLevel::Delete,
            PermissionLevel::Create,
            PermissionLevel::Owner,
        ];

        ALL
    }

    /// Returns whether holding this level satisfies `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }

    /// Flattens a resolved level into its integer form, using
    /// [`NO_ACCESS_LEVEL`] when nothing matched.
    #[must_use]
    pub fn value_or_no_access(level: Option<Self>) -> i16 {
        level.map_or(NO_ACCESS_LEVEL, Self::value)
    }

    /// Parses a transport value given either as a name or as an integer.
    pub fn parse_transport(value: &str) -> Result<Self, AppError> {
        match value.trim().parse::<i16>() {
            Ok(number) => Self::from_value(number),
            Err(_) => Self::from_str(value.trim()),
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "share" => Ok(Self::Share),
            "delete" => Ok(Self::Delete),
            "create" => Ok(Self::Create),
            "owner" => Ok(Self::Owner),
            _ => Err(AppError::Validation(format!(
                "unknown permission level '{value}'"
            ))),
        }
    }
}

/// Operation an actor attempts on an entity type or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOperation {
    /// Reading one record.
    View,
    /// Updating one record.
    Update,
    /// Sharing one record.
    Share,
    /// Deleting one record.
    Delete,
    /// Creating a record of a type.
    Create,
}

impl AccessOperation {
    /// Returns the minimum level the operation requires.
    #[must_use]
    pub fn required_level(self) -> PermissionLevel {
        match self {
            Self::View => PermissionLevel::View,
            Self::Update => PermissionLevel::Edit,
            Self::Share => PermissionLevel::Share,
            Self::Delete => PermissionLevel::Delete,
            Self::Create => PermissionLevel::Create,
        }
    }

    /// Returns whether the operation is checked at type level rather than
    /// against a concrete instance.
    #[must_use]
    pub fn is_type_level(self) -> bool {
        matches!(self, Self::Create)
    }

    /// Returns the stable name of this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Share => "share",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{AccessOperation, NO_ACCESS_LEVEL, PermissionLevel};

    fn any_level() -> impl Strategy<Value = PermissionLevel> {
        prop::sample::select(PermissionLevel::all().to_vec())
    }

    proptest! {
        #[test]
        fn satisfies_matches_integer_ordering(held in any_level(), required in any_level()) {
            prop_assert_eq!(held.satisfies(required), held.value() >= required.value());
        }

        #[test]
        fn satisfied_level_implies_every_lower_level(held in any_level(), required in any_level()) {
            prop_assume!(held.satisfies(required));
            for lower in PermissionLevel::all().iter().filter(|level| **level <= required) {
                prop_assert!(held.satisfies(*lower));
            }
        }
    }

    #[test]
    fn out_of_range_levels_are_rejected() {
        assert!(PermissionLevel::from_value(-1).is_err());
        assert!(PermissionLevel::from_value(6).is_err());
    }

    #[test]
    fn transport_accepts_names_and_numbers() {
        assert!(matches!(
            PermissionLevel::parse_transport("3"),
            Ok(PermissionLevel::Delete)
        ));
        assert!(matches!(
            PermissionLevel::parse_transport("owner"),
            Ok(PermissionLevel::Owner)
        ));
        assert!(PermissionLevel::parse_transport("admin").is_err());
    }

    #[test]
    fn missing_level_flattens_to_no_access() {
        assert_eq!(PermissionLevel::value_or_no_access(None), NO_ACCESS_LEVEL);
        assert_eq!(
            PermissionLevel::value_or_no_access(Some(PermissionLevel::View)),
            0
        );
    }

    #[test]
    fn mutation_thresholds() {
        assert_eq!(
            AccessOperation::Create.required_level(),
            PermissionLevel::Create
        );
        assert_eq!(
            AccessOperation::Update.required_level(),
            PermissionLevel::Edit
        );
        assert_eq!(
            AccessOperation::Delete.required_level(),
            PermissionLevel::Delete
        );
        assert!(AccessOperation::Create.is_type_level());
        assert!(!AccessOperation::Delete.is_type_level());
    }
}
