//! # Storage Layer
//!
//! The persistence boundary and its SQLite implementation.
//!
//! ## Key Types
//!
//! - [`Repository`] - Contract every backing store implements
//! - [`SearchRequest`] - Backend-agnostic query plan built from a filter
//! - [`SqliteRepository`] - Embedded SQLite store with FTS5 search
//! - [`HealthInfo`] - Health report returned by every backend
//! - [`Config`] - TOML configuration with environment overrides
//!
//! ## Database Layout
//!
//! | Table | Contents |
//! |-------|----------|
//! | `todos` | One row per todo, labels as a JSON array |
//! | `todo_labels` | One row per label, for label filters |
//! | `todos_fts` | FTS5 index over title and description |
//!
//! The schema version lives in `PRAGMA user_version`.

mod config;
mod health;
mod query;
mod repository;
mod sqlite;

pub use config::{Config, ConfigError, OutputFormat, StorageConfig, ENV_DB_PATH, ENV_TIMEOUT_MS};
pub use health::{HealthInfo, HealthStatus};
pub use query::{Field, Predicate, Query, SearchRequest, Sort, DESCRIPTION_BOOST, TITLE_BOOST};
pub use repository::Repository;
pub use sqlite::{SqliteRepository, DEFAULT_BUSY_TIMEOUT};
