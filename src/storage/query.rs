//! Backend-agnostic search request
//!
//! [`SearchRequest::from_filter`] turns a [`ListFilter`] into a small query
//! plan that any repository can execute:
//!
//! - status becomes an exact term on [`Field::Status`]
//! - every label becomes its own required term on [`Field::Labels`]
//! - search text becomes a relevance match over title (boost 2) and
//!   description (boost 1)
//! - the date bounds become one inclusive range on [`Field::CreateTime`]
//! - all predicates must hold; with none the query matches everything
//!
//! Backends sort on the exact-match form of the sort field (raw bytes, not an
//! analyzed or case-folded form).

use chrono::{DateTime, Utc};

use crate::domain::{ListFilter, SortField, SortOrder, TodoError};

/// Boost applied to title matches
pub const TITLE_BOOST: f64 = 2.0;
/// Boost applied to description matches
pub const DESCRIPTION_BOOST: f64 = 1.0;

/// Stored fields a predicate can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Status,
    Labels,
    Title,
    Description,
    CreateTime,
}

/// A single condition on a todo
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact value match. On a multi-valued field, any element may match.
    Term { field: Field, value: String },

    /// Relevance match of free text over several boosted fields
    Match {
        text: String,
        fields: Vec<(Field, f64)>,
    },

    /// Inclusive time range; an absent bound is open
    Range {
        field: Field,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    /// Every predicate must hold
    Bool { must: Vec<Predicate> },
}

impl Query {
    pub fn predicates(&self) -> &[Predicate] {
        match self {
            Query::MatchAll => &[],
            Query::Bool { must } => must,
        }
    }

    /// The relevance match, if the query has one
    pub fn text_match(&self) -> Option<(&str, &[(Field, f64)])> {
        self.predicates().iter().find_map(|p| match p {
            Predicate::Match { text, fields } => Some((text.as_str(), fields.as_slice())),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

/// What a repository should fetch for one `list` or `count` call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    /// `None` means backend default ordering
    pub sort: Option<Sort>,
    pub offset: u64,
    /// `None` means no limit
    pub limit: Option<u64>,
}

impl SearchRequest {
    /// Builds the request for a listing.
    ///
    /// The filter is used as given: defaults are the service's business, so
    /// a zero limit here means "no limit".
    pub fn from_filter(filter: &ListFilter) -> Result<Self, TodoError> {
        let sort = match filter.sort_field()? {
            Some(field) => Some(Sort {
                field,
                order: filter.sort_order()?.unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Self {
            query: build_query(filter)?,
            sort,
            offset: u64::try_from(filter.offset).unwrap_or(0),
            limit: u64::try_from(filter.limit).ok().filter(|l| *l > 0),
        })
    }

    /// Builds the request for a count: same predicates, no paging or sort
    pub fn count_only(filter: &ListFilter) -> Result<Self, TodoError> {
        Ok(Self {
            query: build_query(filter)?,
            sort: None,
            offset: 0,
            limit: None,
        })
    }
}

fn build_query(filter: &ListFilter) -> Result<Query, TodoError> {
    let mut must = Vec::new();

    if let Some(status) = filter.status()? {
        must.push(Predicate::Term {
            field: Field::Status,
            value: status.as_str().to_string(),
        });
    }

    for label in &filter.labels {
        must.push(Predicate::Term {
            field: Field::Labels,
            value: label.clone(),
        });
    }

    if let Some(text) = filter.search_text() {
        must.push(Predicate::Match {
            text: text.to_string(),
            fields: vec![
                (Field::Title, TITLE_BOOST),
                (Field::Description, DESCRIPTION_BOOST),
            ],
        });
    }

    if filter.from_date.is_some() || filter.to_date.is_some() {
        must.push(Predicate::Range {
            field: Field::CreateTime,
            gte: filter.from_date,
            lte: filter.to_date,
        });
    }

    if must.is_empty() {
        Ok(Query::MatchAll)
    } else {
        Ok(Query::Bool { must })
    }
}
