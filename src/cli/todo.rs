//! Todo CLI commands

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use super::app::Session;
use super::output::Output;
use crate::domain::{ListFilter, UpdateTodo};

/// Filters shared by `list` and `count`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Filter by status (pending, in_progress, completed, cancelled, blocked)
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by labels (comma-separated, must have all)
    #[arg(long, short = 'l', value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Search query for title and description
    #[arg(long, short = 'q')]
    pub search: Option<String>,

    /// Only todos created on or after this time (RFC 3339)
    #[arg(long, value_name = "RFC3339", value_parser = parse_from_date)]
    pub from_date: Option<DateTime<Utc>>,

    /// Only todos created on or before this time (RFC 3339)
    #[arg(long, value_name = "RFC3339", value_parser = parse_to_date)]
    pub to_date: Option<DateTime<Utc>>,
}

impl FilterArgs {
    fn into_filter(self) -> ListFilter {
        ListFilter {
            status: self.status,
            labels: self.labels,
            search_query: self.search,
            from_date: self.from_date,
            to_date: self.to_date,
            ..Default::default()
        }
    }
}

/// Pagination and sorting for `list`
#[derive(Args, Debug, Default)]
pub struct PageArgs {
    /// Maximum number of results (default 50, at most 1000)
    #[arg(long, default_value_t = 0, hide_default_value = true)]
    pub limit: i64,

    /// Number of results to skip
    #[arg(long, default_value_t = 0)]
    pub offset: i64,

    /// Field to sort by (createTime, updateTime, title, status)
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort order (asc, desc)
    #[arg(long)]
    pub sort_order: Option<String>,
}

fn parse_date(value: &str, example: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("{} (use RFC 3339, e.g. {})", e, example))
}

fn parse_from_date(value: &str) -> Result<DateTime<Utc>, String> {
    parse_date(value, "2025-01-15T00:00:00Z")
}

fn parse_to_date(value: &str) -> Result<DateTime<Utc>, String> {
    parse_date(value, "2025-01-15T23:59:59Z")
}

pub fn create(
    session: &Session,
    output: &Output,
    title: &str,
    description: &str,
    labels: Vec<String>,
) -> Result<()> {
    let todo = session
        .service
        .create_todo(&session.context(), title, description, labels)?;

    if output.is_json() {
        output.todo(&todo);
    } else {
        output.success(&format!("Created todo: {} - {}", todo.id(), todo.title()));
    }

    Ok(())
}

pub fn get(session: &Session, output: &Output, id: &str) -> Result<()> {
    let todo = session.service.get_todo(&session.context(), id)?;
    output.todo(&todo);
    Ok(())
}

pub fn update(session: &Session, output: &Output, id: &str, patch: UpdateTodo) -> Result<()> {
    let todo = session
        .service
        .update_todo(&session.context(), id, patch)?;

    if output.is_json() {
        output.todo(&todo);
    } else {
        output.success(&format!("Updated todo: {}", todo.id()));
    }

    Ok(())
}

pub fn mark(session: &Session, output: &Output, id: &str, status: &str) -> Result<()> {
    let todo = session
        .service
        .change_status(&session.context(), id, status)?;

    if output.is_json() {
        output.todo(&todo);
    } else {
        output.success(&format!("Marked {} as {}", todo.id(), todo.status()));
    }

    Ok(())
}

pub fn delete(session: &Session, output: &Output, id: &str) -> Result<()> {
    session.service.delete_todo(&session.context(), id)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "deleted": id.trim() }));
    } else {
        output.success(&format!("Deleted todo: {}", id.trim()));
    }

    Ok(())
}

pub fn list(session: &Session, output: &Output, filter: FilterArgs, page: PageArgs) -> Result<()> {
    let filter = ListFilter {
        limit: page.limit,
        offset: page.offset,
        sort_by: page.sort_by,
        sort_order: page.sort_order,
        ..filter.into_filter()
    };

    let todos = session.service.list_todos(&session.context(), &filter)?;
    output.todos(&todos);
    Ok(())
}

pub fn count(session: &Session, output: &Output, filter: FilterArgs) -> Result<()> {
    let count = session
        .service
        .count_todos(&session.context(), &filter.into_filter())?;

    if output.is_json() {
        output.data(&serde_json::json!({ "count": count }));
    } else {
        println!("{}", count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_args_map_onto_list_filter() {
        let args = FilterArgs {
            status: Some("pending".into()),
            labels: vec!["a".into(), "b".into()],
            search: Some("milk".into()),
            from_date: None,
            to_date: None,
        };

        let filter = args.into_filter();
        assert_eq!(filter.status.as_deref(), Some("pending"));
        assert_eq!(filter.labels, vec!["a", "b"]);
        assert_eq!(filter.search_query.as_deref(), Some("milk"));
        assert_eq!(filter.limit, 0);
    }

    #[test]
    fn dates_must_be_rfc3339() {
        assert!(parse_from_date("2025-01-15T00:00:00Z").is_ok());
        assert!(parse_to_date("2025-01-15T23:59:59+02:00").is_ok());

        let err = parse_from_date("2025-01-15").unwrap_err();
        assert!(err.contains("RFC 3339"));
    }
}
