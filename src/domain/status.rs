//! Todo status value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TodoError;

/// Status of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Blocked,
}

/// Transitions that are rejected. Everything not listed here is allowed,
/// including moving a status onto itself.
const FORBIDDEN_TRANSITIONS: &[(Status, Status)] = &[(Status::Completed, Status::Blocked)];

impl Status {
    /// All valid statuses, in lifecycle order
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
        Status::Blocked,
    ];

    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::Blocked => "blocked",
        }
    }

    /// Returns true if this status represents completion
    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }

    /// Returns true if a todo in this status may move to `next`
    pub fn can_transition_to(&self, next: Status) -> bool {
        !FORBIDDEN_TRANSITIONS.contains(&(*self, next))
    }

    /// Comma-separated list of valid values, for error messages
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(Status::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                TodoError::InvalidStatus(format!(
                    "invalid status '{}' (valid: {})",
                    s,
                    Self::valid_values()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_pending() {
        assert_eq!(Status::default(), Status::Pending);
    }

    #[test]
    fn parse_all_values() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn parse_unknown_names_value_and_valid_set() {
        let err = "done".parse::<Status>().unwrap_err();
        assert!(err.is_invalid_status());

        let message = err.to_string();
        assert!(message.contains("'done'"));
        assert!(message.contains("pending, in_progress, completed, cancelled, blocked"));
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Pending".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn only_completed_to_blocked_is_forbidden() {
        for from in Status::ALL {
            for to in Status::ALL {
                let expected = !(from == Status::Completed && to == Status::Blocked);
                assert_eq!(from.can_transition_to(to), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: Status = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, Status::Cancelled);
    }
}
