use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult};

const ALL_ENTITIES_UUID: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);

/// Identifier of a person or a role that permissions are granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Creates an actor identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Creates a random actor identifier.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a transport value into an actor identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        let parsed = Uuid::parse_str(value.trim()).map_err(|error| {
            AppError::Validation(format!("invalid actor identifier '{value}': {error}"))
        })?;
        if parsed.is_nil() || parsed == ALL_ENTITIES_UUID {
            return Err(AppError::Validation(format!(
                "actor identifier '{value}' is reserved"
            )));
        }

        Ok(Self(parsed))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for ActorId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of one entity instance, or the reserved all-instances scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Reserved scope meaning "every instance of the entity type".
    ///
    /// Grants stored with this scope are type-level grants. The value is part
    /// of the public storage contract and never changes.
    pub const ALL: Self = Self(ALL_ENTITIES_UUID);

    /// Creates an entity identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Creates a random instance identifier.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a transport value into an entity identifier.
    ///
    /// The all-instances scope is accepted; the nil UUID is not.
    pub fn parse(value: &str) -> AppResult<Self> {
        let parsed = Uuid::parse_str(value.trim()).map_err(|error| {
            AppError::Validation(format!("invalid entity identifier '{value}': {error}"))
        })?;
        if parsed.is_nil() {
            return Err(AppError::Validation(
                "entity identifier must not be the nil UUID".to_owned(),
            ));
        }

        Ok(Self(parsed))
    }

    /// Returns whether this is the all-instances scope.
    #[must_use]
    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Entity type code such as `project` or `task`.
///
/// Codes are lower snake-case identifiers so adapters may use them as table
/// names after validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityTypeCode(String);

impl EntityTypeCode {
    /// Maximum accepted code length.
    pub const MAX_LENGTH: usize = 63;

    /// Creates a validated entity type code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let mut characters = value.chars();
        let starts_with_letter = characters
            .next()
            .map(|first| first.is_ascii_lowercase())
            .unwrap_or(false);
        let rest_is_valid = characters.all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });

        if !starts_with_letter || !rest_is_valid || value.len() > Self::MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "invalid entity type code '{value}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the reserved code of role (group) instances.
    #[must_use]
    pub fn role() -> Self {
        Self(Self::ROLE.to_owned())
    }

    /// Returns the reserved code of individual (person) instances.
    #[must_use]
    pub fn individual() -> Self {
        Self(Self::INDIVIDUAL.to_owned())
    }

    /// Reserved code of role (group) instances.
    pub const ROLE: &'static str = "role";

    /// Reserved code of individual (person) instances.
    pub const INDIVIDUAL: &'static str = "individual";

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EntityTypeCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityTypeCode> for String {
    fn from(value: EntityTypeCode) -> Self {
        value.0
    }
}

impl Display for EntityTypeCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
