//! Todo identifiers
//!
//! IDs are random UUIDs (v4) rendered in the hyphenated form
//! (e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`). Parsing is strict:
//! anything the `uuid` crate does not accept is rejected before it can
//! reach a backing store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("id is required")]
    Empty,

    #[error("invalid id format: expected a UUID, got '{0}'")]
    Invalid(String),
}

/// Identifier of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoId(Uuid);

impl TodoId {
    /// Generates a fresh random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TodoId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TodoId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdError::Invalid(s.to_string()))
    }
}

impl TryFrom<String> for TodoId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TodoId> for String {
    fn from(id: TodoId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = TodoId::new();
        let b = TodoId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let id = TodoId::new();
        let parsed: TodoId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = TodoId::new();
        let parsed: TodoId = format!("  {}  ", id).parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_empty_fails() {
        assert_eq!("".parse::<TodoId>(), Err(IdError::Empty));
        assert_eq!("   ".parse::<TodoId>(), Err(IdError::Empty));
    }

    #[test]
    fn parse_malformed_fails() {
        assert_eq!(
            "not-a-uuid".parse::<TodoId>(),
            Err(IdError::Invalid("not-a-uuid".to_string()))
        );
        assert!("12345".parse::<TodoId>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let id = TodoId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let parsed: TodoId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<TodoId>("\"bogus\"").is_err());
    }
}
