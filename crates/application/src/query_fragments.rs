use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use accessgate_core::{AppError, AppResult, EntityId, EntityTypeCode};

/// Table alias a fragment refers to inside a caller's query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryAlias(String);

impl QueryAlias {
    /// Creates a validated alias: a lower snake-case SQL identifier.
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

        if !starts_with_letter || !rest_is_valid || value.len() > 63 {
            return Err(AppError::Validation(format!(
                "invalid query alias '{value}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for QueryAlias {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Row filter produced by the RBAC gate.
///
/// Every variant is safe to conjoin with arbitrary other predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPredicate {
    /// The actor may access every row.
    MatchAll,
    /// The actor may access no row.
    MatchNone,
    /// The aliased row identifier must be one of `ids`.
    IdIn {
        /// Alias of the filtered entity.
        alias: QueryAlias,
        /// Accessible identifiers, never empty.
        ids: BTreeSet<EntityId>,
    },
}

impl AccessPredicate {
    /// Evaluates the predicate for one row identifier.
    #[must_use]
    pub fn admits(&self, entity_id: EntityId) -> bool {
        match self {
            Self::MatchAll => true,
            Self::MatchNone => false,
            Self::IdIn { ids, .. } => ids.contains(&entity_id),
        }
    }
}

/// Join fragment restricting an aliased child entity to one parent instance.
///
/// An instance may be linked to the same parent more than once, so queries
/// carrying this fragment must project distinct rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentScopeJoin {
    /// Alias of the filtered child entity.
    pub alias: QueryAlias,
    /// Child type the link must declare.
    pub child_type: EntityTypeCode,
    /// Parent type the link must declare.
    pub parent_type: EntityTypeCode,
    /// Parent instance the link must point from.
    pub parent_id: EntityId,
    /// Optional relationship classification the link must carry.
    pub relation_kind: Option<String>,
}

impl ParentScopeJoin {
    /// Narrows the join to links of one relationship classification.
    #[must_use]
    pub fn with_relation_kind(mut self, relation_kind: impl Into<String>) -> Self {
        self.relation_kind = Some(relation_kind.into());
        self
    }
}

/// Caller-side predicate conjoined into an entity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPredicate {
    /// Permission filter from the RBAC gate.
    Access(AccessPredicate),
    /// Only rows whose active flag is set.
    ActiveOnly {
        /// Alias of the filtered entity.
        alias: QueryAlias,
    },
    /// Case-insensitive substring match on the row name.
    NameContains {
        /// Alias of the filtered entity.
        alias: QueryAlias,
        /// Search term, matched literally.
        term: String,
    },
}

/// Composed query over one entity type.
///
/// Count and data reads of one listing use the same value, so both observe
/// the identical predicate and join set. Counting ignores pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    /// Queried entity type.
    pub entity_type: EntityTypeCode,
    /// Alias of the queried entity.
    pub alias: QueryAlias,
    /// Conjoined predicates.
    pub predicates: Vec<RecordPredicate>,
    /// Parent scope joins.
    pub joins: Vec<ParentScopeJoin>,
    /// Maximum rows returned by data reads.
    pub limit: usize,
    /// Rows skipped by data reads.
    pub offset: usize,
}

impl EntityQuery {
    /// Starts an unfiltered query.
    #[must_use]
    pub fn new(entity_type: EntityTypeCode, alias: QueryAlias) -> Self {
        Self {
            entity_type,
            alias,
            predicates: Vec::new(),
            joins: Vec::new(),
            limit: 20,
            offset: 0,
        }
    }

    /// Adds one conjoined predicate.
    #[must_use]
    pub fn with_predicate(mut self, predicate: RecordPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds one parent scope join.
    #[must_use]
    pub fn with_join(mut self, join: ParentScopeJoin) -> Self {
        self.joins.push(join);
        self
    }

    /// Sets data read pagination.
    #[must_use]
    pub fn paginate(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Returns whether the projection must be distinct to absorb link fan-out.
    #[must_use]
    pub fn requires_distinct(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Returns whether a conjoined predicate rules out every row.
    #[must_use]
    pub fn matches_nothing(&self) -> bool {
        self.predicates.iter().any(|predicate| {
            matches!(
                predicate,
                RecordPredicate::Access(AccessPredicate::MatchNone)
            )
        })
    }

    /// Validates that every fragment refers to the query alias.
    pub fn validate(&self) -> AppResult<()> {
        let foreign_alias = self
            .predicates
            .iter()
            .filter_map(|predicate| match predicate {
                RecordPredicate::Access(AccessPredicate::IdIn { alias, .. })
                | RecordPredicate::ActiveOnly { alias }
                | RecordPredicate::NameContains { alias, .. } => Some(alias),
                RecordPredicate::Access(_) => None,
            })
            .chain(self.joins.iter().map(|join| &join.alias))
            .find(|alias| *alias != &self.alias);

        if let Some(alias) = foreign_alias {
            return Err(AppError::Validation(format!(
                "fragment alias '{alias}' does not match query alias '{}'",
                self.alias
            )));
        }

        if let Some(join) = self
            .joins
            .iter()
            .find(|join| join.child_type != self.entity_type)
        {
            return Err(AppError::Validation(format!(
                "parent scope join targets '{}' but the query reads '{}'",
                join.child_type, self.entity_type
            )));
        }

        Ok(())
    }
}
