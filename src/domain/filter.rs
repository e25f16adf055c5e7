//! List filter value object
//!
//! A [`ListFilter`] carries what the caller asked for: the status, sort field
//! and sort order are kept as the raw strings the caller supplied (empty or
//! `None` meaning unset) so that [`ListFilter::validate`] can name the
//! offending value. Typed views are available through
//! [`ListFilter::status`], [`ListFilter::sort_field`] and
//! [`ListFilter::sort_order`] once the filter has been validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TodoError;
use super::sort::{SortField, SortOrder};
use super::status::Status;

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a listing may request
pub const MAX_LIMIT: i64 = 1000;

/// Filtering, sorting and pagination options for listing todos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListFilter {
    /// Exact status to match
    pub status: Option<String>,

    /// Labels a todo must all carry
    pub labels: Vec<String>,

    /// Free text matched against title and description
    pub search_query: Option<String>,

    /// Inclusive lower bound on creation time
    pub from_date: Option<DateTime<Utc>>,

    /// Inclusive upper bound on creation time
    pub to_date: Option<DateTime<Utc>>,

    /// Maximum number of results; zero or less means "use the default"
    pub limit: i64,

    /// Number of results to skip
    pub offset: i64,

    /// Field to sort by
    pub sort_by: Option<String>,

    /// `asc` or `desc`
    pub sort_order: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ListFilter {
    /// Creates an empty filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(sort_order.into());
        self
    }

    /// Checks that every set value is one the system understands
    pub fn validate(&self) -> Result<(), TodoError> {
        if let Some(status) = non_empty(&self.status) {
            status.parse::<Status>().map_err(|e| match e {
                TodoError::InvalidStatus(reason) => TodoError::invalid_input(reason),
                other => other,
            })?;
        }

        if let Some(sort_by) = non_empty(&self.sort_by) {
            sort_by.parse::<SortField>()?;
        }

        if let Some(sort_order) = non_empty(&self.sort_order) {
            sort_order.parse::<SortOrder>()?;
        }

        if self.limit < 0 {
            return Err(TodoError::invalid_input(format!(
                "limit must not be negative, got {}",
                self.limit
            )));
        }

        if self.offset < 0 {
            return Err(TodoError::invalid_input(format!(
                "offset must not be negative, got {}",
                self.offset
            )));
        }

        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(TodoError::invalid_input(format!(
                    "from date {} is after to date {}",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }

        Ok(())
    }

    /// Returns a copy with limit, sort field and sort order filled in.
    ///
    /// A limit of zero (or less) is indistinguishable from "unset" and
    /// becomes [`DEFAULT_LIMIT`]; anything above [`MAX_LIMIT`] is clamped.
    pub fn with_defaults(&self) -> ListFilter {
        let mut filter = self.clone();

        filter.limit = if filter.limit <= 0 {
            DEFAULT_LIMIT
        } else {
            filter.limit.min(MAX_LIMIT)
        };

        if non_empty(&filter.sort_by).is_none() {
            filter.sort_by = Some(SortField::default().as_str().to_string());
        }

        if non_empty(&filter.sort_order).is_none() {
            filter.sort_order = Some(SortOrder::default().as_str().to_string());
        }

        filter
    }

    /// Parsed status, `None` when unset
    pub fn status(&self) -> Result<Option<Status>, TodoError> {
        non_empty(&self.status).map(str::parse::<Status>).transpose()
    }

    /// Parsed sort field, `None` when unset
    pub fn sort_field(&self) -> Result<Option<SortField>, TodoError> {
        non_empty(&self.sort_by).map(str::parse::<SortField>).transpose()
    }

    /// Parsed sort order, `None` when unset
    pub fn sort_order(&self) -> Result<Option<SortOrder>, TodoError> {
        non_empty(&self.sort_order).map(str::parse::<SortOrder>).transpose()
    }

    /// Search text, `None` when unset or blank
    pub fn search_text(&self) -> Option<&str> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
