//! Shared primitives for all Rust crates in Accessgate.

#![forbid(unsafe_code)]

/// Identifier newtypes shared by every layer.
pub mod identifiers;

use thiserror::Error;

pub use identifiers::{ActorId, EntityId, EntityTypeCode};

/// Result type used across Accessgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// "No access" is never represented here: read paths return empty results
/// instead. Only enforcement calls produce [`AppError::AccessDenied`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed identifier or invalid input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Actor is below the level an enforced operation requires.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A backing store could not be reached or failed to answer.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error, such as undecodable persisted data.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the error belongs to the resolution failure family.
    ///
    /// Resolution failures must be surfaced as generic failures by callers and
    /// never be mistaken for an empty permission result.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Unavailable(_) | Self::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn access_denied_is_not_a_resolution_error() {
        let error = AppError::AccessDenied("nope".to_owned());
        assert!(!error.is_resolution_error());
    }

    #[test]
    fn store_failures_are_resolution_errors() {
        assert!(AppError::Unavailable("pool closed".to_owned()).is_resolution_error());
        assert!(AppError::Validation("bad id".to_owned()).is_resolution_error());
    }
}
