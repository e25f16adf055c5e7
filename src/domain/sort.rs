//! Sort field and sort order value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TodoError;

/// Direction of sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 2] = [SortOrder::Asc, SortOrder::Desc];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Asc)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                TodoError::invalid_input(format!("invalid sort order '{}' (valid: asc, desc)", s))
            })
    }
}

/// Fields a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreateTime,
    UpdateTime,
    Title,
    Status,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::CreateTime,
        SortField::UpdateTime,
        SortField::Title,
        SortField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreateTime => "createTime",
            SortField::UpdateTime => "updateTime",
            SortField::Title => "title",
            SortField::Status => "status",
        }
    }

    /// Comma-separated list of valid values, for error messages
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(SortField::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                TodoError::invalid_input(format!(
                    "invalid sort field '{}' (valid: {})",
                    s,
                    Self::valid_values()
                ))
            })
    }
}
