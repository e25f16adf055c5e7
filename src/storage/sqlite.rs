//! SQLite repository
//!
//! Todos live in a single database file. Labels are stored twice: as a JSON
//! array on the todo row (keeps their order) and one row per label in
//! `todo_labels` (for conjunctive label filters). Title and description are
//! indexed by an external-content FTS5 table kept in sync by triggers.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text with nanosecond
//! precision, so comparing the text compares the instants.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::domain::{ListFilter, SortField, Status, Todo, TodoError, TodoId, TodoRecord};

use super::health::{HealthInfo, HealthStatus};
use super::query::{Field, Predicate, SearchRequest};
use super::repository::Repository;

/// Virtual machine instructions between two cancellation checks
const PROGRESS_OPS: i32 = 1_000;

/// Health probes slower than this report `degraded`
const SLOW_PROBE: Duration = Duration::from_millis(500);

/// Default time to wait on a locked database
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str = "t.id, t.title, t.description, t.labels, t.status, t.create_time, t.update_time";

/// Columns of the FTS table, in declaration order
const FTS_COLUMNS: [Field; 2] = [Field::Title, Field::Description];

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        labels TEXT NOT NULL DEFAULT '[]',
        status TEXT NOT NULL,
        create_time TEXT NOT NULL,
        update_time TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS todo_labels (
        todo_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        label TEXT NOT NULL,
        PRIMARY KEY (todo_id, position)
    );

    CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status);
    CREATE INDEX IF NOT EXISTS idx_todos_create_time ON todos(create_time);
    CREATE INDEX IF NOT EXISTS idx_todos_update_time ON todos(update_time);
    CREATE INDEX IF NOT EXISTS idx_todos_title ON todos(title COLLATE BINARY);
    CREATE INDEX IF NOT EXISTS idx_todo_labels_label ON todo_labels(label, todo_id);

    -- Full-text search
    CREATE VIRTUAL TABLE IF NOT EXISTS todos_fts USING fts5(
        title,
        description,
        content='todos',
        content_rowid='seq'
    );

    -- Triggers to keep FTS in sync
    CREATE TRIGGER IF NOT EXISTS todos_ai AFTER INSERT ON todos BEGIN
        INSERT INTO todos_fts(rowid, title, description)
        VALUES (NEW.seq, NEW.title, NEW.description);
    END;

    CREATE TRIGGER IF NOT EXISTS todos_ad AFTER DELETE ON todos BEGIN
        INSERT INTO todos_fts(todos_fts, rowid, title, description)
        VALUES ('delete', OLD.seq, OLD.title, OLD.description);
    END;

    CREATE TRIGGER IF NOT EXISTS todos_au AFTER UPDATE ON todos BEGIN
        INSERT INTO todos_fts(todos_fts, rowid, title, description)
        VALUES ('delete', OLD.seq, OLD.title, OLD.description);
        INSERT INTO todos_fts(rowid, title, description)
        VALUES (NEW.seq, NEW.title, NEW.description);
    END;
";

/// [`Repository`] backed by an embedded SQLite database
pub struct SqliteRepository {
    conn: Connection,

    /// `None` for in-memory databases
    path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Schema version - bump when the schema changes
    pub const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the database at `path` and brings its
    /// schema up to date
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, TodoError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                TodoError::backend(
                    format!("failed to create database directory {}", dir.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            TodoError::backend(format!("failed to open database {}", path.display()), e)
        })?;

        conn.busy_timeout(busy_timeout)
            .and_then(|_| conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;"))
            .map_err(|e| TodoError::backend("failed to configure database", e))?;

        let repo = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        repo.ensure_schema()?;

        debug!(path = %path.display(), "opened todo database");
        Ok(repo)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, TodoError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TodoError::backend("failed to open in-memory database", e))?;

        let repo = Self { conn, path: None };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// Path of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Creates or upgrades the schema. Safe to run any number of times.
    pub fn migrate(&self) -> Result<(), TodoError> {
        let current = self.schema_version()?;
        if current > Self::SCHEMA_VERSION {
            return Err(TodoError::backend(
                "failed to migrate database",
                format!(
                    "schema version {} is newer than supported version {}",
                    current,
                    Self::SCHEMA_VERSION
                ),
            ));
        }

        self.conn
            .execute_batch(SCHEMA)
            .and_then(|_| {
                self.conn.execute_batch(&format!(
                    "PRAGMA user_version = {}",
                    Self::SCHEMA_VERSION
                ))
            })
            .map_err(|e| TodoError::backend("failed to migrate database", e))?;

        if current != Self::SCHEMA_VERSION {
            info!(from = current, to = Self::SCHEMA_VERSION, "migrated todo schema");
        }
        Ok(())
    }

    /// Current `user_version` of the database
    pub fn schema_version(&self) -> Result<i32, TodoError> {
        let version: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()
            .map_err(|e| TodoError::backend("failed to read schema version", e))?;

        Ok(version.unwrap_or(0))
    }

    fn ensure_schema(&self) -> Result<(), TodoError> {
        if self.schema_version()? != Self::SCHEMA_VERSION {
            self.migrate()?;
        }
        Ok(())
    }

    /// Runs `op` with the context wired into SQLite's progress handler, so
    /// a cancel or an expired deadline interrupts the running statement.
    fn run<T>(
        &self,
        ctx: &CallContext,
        what: &str,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, TodoError> {
        ctx.check()?;

        let _interrupt = InterruptGuard::install(&self.conn, ctx);
        op(&self.conn).map_err(|e| translate(ctx, what, e))
    }

    fn probe(&self) -> rusqlite::Result<Probe> {
        let version: String = self
            .conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        let todos: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        let pages: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let journal_mode: String = self
            .conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))?;

        Ok(Probe {
            version,
            todos,
            pages,
            journal_mode,
        })
    }
}

impl Repository for SqliteRepository {
    fn health(&self, ctx: &CallContext) -> Result<HealthInfo, TodoError> {
        ctx.check()?;

        let started = Instant::now();
        let probe = {
            let _interrupt = InterruptGuard::install(&self.conn, ctx);
            self.probe()
        };
        let elapsed = started.elapsed();

        let probe = match probe {
            Ok(probe) => probe,
            Err(e) if is_interrupt(&e) => return Err(ctx.err().unwrap_or(TodoError::Cancelled)),
            Err(e) => {
                warn!(error = %e, "health probe failed");
                return Ok(HealthInfo::unavailable(elapsed, e.to_string()));
            }
        };

        let mut info = HealthInfo {
            status: if elapsed > SLOW_PROBE {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            available: true,
            response_time: elapsed,
            node_count: None,
            active_connections: Some(1),
            version: Some(probe.version),
            details: Default::default(),
        };
        info.details.insert("todoCount".into(), json!(probe.todos));
        info.details.insert("pageCount".into(), json!(probe.pages));
        info.details
            .insert("journalMode".into(), json!(probe.journal_mode));
        info.details.insert(
            "path".into(),
            json!(self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())),
        );

        Ok(info)
    }

    fn create(&self, ctx: &CallContext, todo: &Todo) -> Result<(), TodoError> {
        let row = StoredTodo::from_todo(todo)?;

        let result = self.run(ctx, "failed to insert todo", |conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO todos (id, title, description, labels, status, create_time, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.title,
                    row.description,
                    row.labels,
                    row.status,
                    row.create_time,
                    row.update_time,
                ],
            )?;
            insert_labels(&tx, &row.id, todo.labels())?;
            tx.commit()
        });

        result.map_err(|e| {
            if is_constraint_violation(&e) {
                TodoError::Conflict(row.id.clone())
            } else {
                e
            }
        })
    }

    fn get(&self, ctx: &CallContext, id: &TodoId) -> Result<Todo, TodoError> {
        let id = id.to_string();

        let row = self.run(ctx, "failed to get todo", |conn| {
            conn.query_row(
                &format!("SELECT {} FROM todos t WHERE t.id = ?1", COLUMNS),
                params![id],
                StoredTodo::from_row,
            )
            .optional()
        })?;

        match row {
            Some(row) => row.into_todo(),
            None => Err(TodoError::NotFound(id)),
        }
    }

    fn update(&self, ctx: &CallContext, todo: &Todo) -> Result<(), TodoError> {
        let row = StoredTodo::from_todo(todo)?;

        let found = self.run(ctx, "failed to update todo", |conn| {
            let tx = conn.unchecked_transaction()?;
            let changed = tx.execute(
                "UPDATE todos
                 SET title = ?2, description = ?3, labels = ?4, status = ?5,
                     create_time = ?6, update_time = ?7
                 WHERE id = ?1",
                params![
                    row.id,
                    row.title,
                    row.description,
                    row.labels,
                    row.status,
                    row.create_time,
                    row.update_time,
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }

            tx.execute("DELETE FROM todo_labels WHERE todo_id = ?1", params![row.id])?;
            insert_labels(&tx, &row.id, todo.labels())?;
            tx.commit()?;
            Ok(true)
        })?;

        if found {
            Ok(())
        } else {
            Err(TodoError::NotFound(row.id))
        }
    }

    fn delete(&self, ctx: &CallContext, id: &TodoId) -> Result<(), TodoError> {
        let id = id.to_string();

        let changed = self.run(ctx, "failed to delete todo", |conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM todo_labels WHERE todo_id = ?1", params![id])?;
            let changed = tx.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(changed)
        })?;

        if changed == 0 {
            return Err(TodoError::NotFound(id));
        }
        Ok(())
    }

    fn list(&self, ctx: &CallContext, filter: &ListFilter) -> Result<Vec<Todo>, TodoError> {
        let request = SearchRequest::from_filter(filter)?;
        let compiled = compile(&request, Select::Rows);
        debug!(sql = %compiled.sql, "listing todos");

        let rows = self.run(ctx, "failed to list todos", |conn| {
            let mut stmt = conn.prepare(&compiled.sql)?;
            let rows = stmt
                .query_map(params_from_iter(compiled.params.iter()), StoredTodo::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(StoredTodo::into_todo).collect()
    }

    fn count(&self, ctx: &CallContext, filter: &ListFilter) -> Result<u64, TodoError> {
        let request = SearchRequest::count_only(filter)?;
        let compiled = compile(&request, Select::Count);
        debug!(sql = %compiled.sql, "counting todos");

        let count: i64 = self.run(ctx, "failed to count todos", |conn| {
            conn.query_row(
                &compiled.sql,
                params_from_iter(compiled.params.iter()),
                |row| row.get(0),
            )
        })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Installs a progress handler for as long as it lives
struct InterruptGuard<'c> {
    conn: &'c Connection,
}

impl<'c> InterruptGuard<'c> {
    fn install(conn: &'c Connection, ctx: &CallContext) -> Self {
        let ctx = ctx.clone();
        conn.progress_handler(PROGRESS_OPS, Some(move || ctx.should_abort()));
        Self { conn }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
}

fn is_constraint_violation(err: &TodoError) -> bool {
    match err {
        TodoError::Backend { source, .. } => source
            .downcast_ref::<rusqlite::Error>()
            .and_then(rusqlite::Error::sqlite_error_code)
            == Some(ErrorCode::ConstraintViolation),
        _ => false,
    }
}

/// Maps a SQLite failure, turning interruptions back into the context's error
fn translate(ctx: &CallContext, what: &str, err: rusqlite::Error) -> TodoError {
    if is_interrupt(&err) {
        return ctx.err().unwrap_or(TodoError::Cancelled);
    }
    TodoError::backend(what, err)
}

fn insert_labels(conn: &Connection, id: &str, labels: &[String]) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO todo_labels (todo_id, position, label) VALUES (?1, ?2, ?3)")?;
    for (position, label) in labels.iter().enumerate() {
        stmt.execute(params![id, position as i64, label])?;
    }
    Ok(())
}

struct Probe {
    version: String,
    todos: i64,
    pages: i64,
    journal_mode: String,
}

/// A todo as stored in a `todos` row
struct StoredTodo {
    id: String,
    title: String,
    description: String,
    labels: String,
    status: String,
    create_time: String,
    update_time: String,
}

impl StoredTodo {
    fn from_todo(todo: &Todo) -> Result<Self, TodoError> {
        let labels = serde_json::to_string(todo.labels())
            .map_err(|e| TodoError::backend("failed to encode labels", e))?;

        Ok(Self {
            id: todo.id().to_string(),
            title: todo.title().to_string(),
            description: todo.description().to_string(),
            labels,
            status: todo.status().as_str().to_string(),
            create_time: format_timestamp(&todo.create_time()),
            update_time: format_timestamp(&todo.update_time()),
        })
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            labels: row.get(3)?,
            status: row.get(4)?,
            create_time: row.get(5)?,
            update_time: row.get(6)?,
        })
    }

    fn into_todo(self) -> Result<Todo, TodoError> {
        let corrupt = |e: Box<dyn std::error::Error + Send + Sync>| {
            TodoError::backend(format!("corrupt todo row {}", self.id), e)
        };

        let record = TodoRecord {
            id: self.id.parse().map_err(|e: crate::domain::IdError| corrupt(e.into()))?,
            title: self.title.clone(),
            description: self.description.clone(),
            labels: serde_json::from_str(&self.labels).map_err(|e| corrupt(e.into()))?,
            status: self
                .status
                .parse::<Status>()
                .map_err(|e| corrupt(e.into()))?,
            create_time: parse_timestamp(&self.create_time).map_err(|e| corrupt(e.into()))?,
            update_time: parse_timestamp(&self.update_time).map_err(|e| corrupt(e.into()))?,
        };

        Todo::try_from(record).map_err(|e| corrupt(e.into()))
    }
}

fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Select {
    Rows,
    Count,
}

/// SQL text plus its positional parameters
#[derive(Debug)]
struct Compiled {
    sql: String,
    params: Vec<Value>,
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Status => "t.status",
        Field::Labels => "t.labels",
        Field::Title => "t.title",
        Field::Description => "t.description",
        Field::CreateTime => "t.create_time",
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreateTime => "t.create_time",
        SortField::UpdateTime => "t.update_time",
        SortField::Title => "t.title COLLATE BINARY",
        SortField::Status => "t.status",
    }
}

/// Quotes every whitespace-separated token so FTS5 never sees its own
/// query syntax, and ORs the tokens together
fn fts_query(text: &str) -> String {
    text.split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn compile(request: &SearchRequest, select: Select) -> Compiled {
    let mut sql = match select {
        Select::Rows => format!("SELECT {} FROM todos t", COLUMNS),
        Select::Count => "SELECT COUNT(*) FROM todos t".to_string(),
    };
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    // All text matches share one FTS join
    let matches: Vec<String> = request
        .query
        .predicates()
        .iter()
        .filter_map(|p| match p {
            Predicate::Match { text, .. } => Some(format!("({})", fts_query(text))),
            _ => None,
        })
        .collect();
    let searching = !matches.is_empty();
    if searching {
        sql.push_str(" JOIN todos_fts ON todos_fts.rowid = t.seq");
        conditions.push("todos_fts MATCH ?".to_string());
        params.push(Value::Text(matches.join(" AND ")));
    }

    for predicate in request.query.predicates() {
        match predicate {
            Predicate::Term {
                field: Field::Labels,
                value,
            } => {
                conditions.push(
                    "EXISTS (SELECT 1 FROM todo_labels l WHERE l.todo_id = t.id AND l.label = ?)"
                        .to_string(),
                );
                params.push(Value::Text(value.clone()));
            }
            Predicate::Term { field, value } => {
                conditions.push(format!("{} = ?", column(*field)));
                params.push(Value::Text(value.clone()));
            }
            Predicate::Range { field, gte, lte } => {
                if let Some(gte) = gte {
                    conditions.push(format!("{} >= ?", column(*field)));
                    params.push(Value::Text(format_timestamp(gte)));
                }
                if let Some(lte) = lte {
                    conditions.push(format!("{} <= ?", column(*field)));
                    params.push(Value::Text(format_timestamp(lte)));
                }
            }
            Predicate::Match { .. } => {}
        }
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if select == Select::Count {
        return Compiled { sql, params };
    }

    match request.sort {
        Some(sort) => {
            let direction = if sort.order.is_ascending() { "ASC" } else { "DESC" };
            sql.push_str(&format!(
                " ORDER BY {} {dir}, t.id {dir}",
                sort_column(sort.field),
                dir = direction
            ));
        }
        None if searching => {
            let weights: Vec<String> = FTS_COLUMNS
                .iter()
                .map(|col| {
                    let boost = request
                        .query
                        .text_match()
                        .and_then(|(_, fields)| fields.iter().find(|(f, _)| f == col))
                        .map(|(_, boost)| *boost)
                        .unwrap_or(0.0);
                    format!("{:.1}", boost)
                })
                .collect();
            sql.push_str(&format!(
                " ORDER BY bm25(todos_fts, {}), t.seq",
                weights.join(", ")
            ));
        }
        None => sql.push_str(" ORDER BY t.seq"),
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(Value::Integer(
        request.limit.map(|l| l.min(i64::MAX as u64) as i64).unwrap_or(-1),
    ));
    params.push(Value::Integer(request.offset.min(i64::MAX as u64) as i64));

    Compiled { sql, params }
}
