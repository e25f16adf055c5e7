//! Error taxonomy shared by the domain, the service and repositories

use std::collections::BTreeMap;
use std::error::Error as StdError;

use thiserror::Error;

use super::id::IdError;

/// Boxed cause of a backend failure
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by todo operations.
///
/// Callers are expected to match on the variant; the message is for humans.
#[derive(Debug, Error)]
pub enum TodoError {
    /// The identifier has no corresponding record
    #[error("todo not found: {0}")]
    NotFound(String),

    /// Malformed identifier, failed field validation, or bad filter
    #[error("invalid input: {reason}")]
    InvalidInput {
        reason: String,
        /// Field name to human-readable message, when the failure is per-field
        fields: BTreeMap<String, String>,
    },

    /// Unknown status value or forbidden transition
    #[error("invalid status transition: {0}")]
    InvalidStatus(String),

    /// A record with the same identity already exists
    #[error("todo already exists: {0}")]
    Conflict(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation finished
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Anything else the backing store reported
    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl TodoError {
    /// Creates an `InvalidInput` error without field details
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TodoError::InvalidInput {
            reason: reason.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Creates a `Backend` error wrapping `source`
    pub fn backend(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        TodoError::Backend {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Adds context to backend failures; every other kind passes through untouched
    pub fn context(self, context: impl Into<String>) -> Self {
        match self {
            TodoError::Backend {
                context: inner,
                source,
            } => TodoError::Backend {
                context: format!("{}: {}", context.into(), inner),
                source,
            },
            other => other,
        }
    }

    /// Returns the per-field messages of a validation failure
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            TodoError::InvalidInput { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TodoError::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, TodoError::InvalidInput { .. })
    }

    pub fn is_invalid_status(&self) -> bool {
        matches!(self, TodoError::InvalidStatus(_))
    }
}

impl From<IdError> for TodoError {
    fn from(err: IdError) -> Self {
        TodoError::invalid_input(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_backend_errors() {
        let err = TodoError::backend("query failed", "disk I/O error").context("failed to list todos");
        assert_eq!(
            err.to_string(),
            "failed to list todos: query failed: disk I/O error"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn context_leaves_domain_kinds_alone() {
        let err = TodoError::NotFound("abc".into()).context("failed to update todo");
        assert!(err.is_not_found());

        let err = TodoError::Cancelled.context("failed to update todo");
        assert!(matches!(err, TodoError::Cancelled));
    }

    #[test]
    fn id_errors_become_invalid_input() {
        let err: TodoError = IdError::Empty.into();
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "invalid input: id is required");
    }

    #[test]
    fn field_errors_only_when_present() {
        assert!(TodoError::invalid_input("bad").field_errors().is_none());

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "title is required".to_string());
        let err = TodoError::InvalidInput {
            reason: "title is required".into(),
            fields,
        };
        assert_eq!(err.field_errors().map(|f| f.len()), Some(1));
    }
}
