//! todoify - a searchable todo list
//!
//! Todos carry a title, an optional description, labels and a status
//! lifecycle. They are stored in an embedded SQLite database with a
//! full-text index and can be listed with filters on status, labels, free
//! text and creation date.
//!
//! [`TodoService`] is the entry point; it depends only on the
//! [`Repository`](storage::Repository) trait, implemented here by
//! [`SqliteRepository`](storage::SqliteRepository).

pub mod cli;
pub mod context;
pub mod domain;
pub mod service;
pub mod storage;

pub use context::CallContext;
pub use domain::{ListFilter, Status, Todo, TodoError, TodoId, UpdateTodo, Validator};
pub use service::TodoService;
