//! Domain models for todoify
//!
//! Contains the core business logic without any I/O concerns.

mod error;
mod filter;
mod id;
mod sort;
mod status;
mod todo;
mod validate;

pub use error::{BoxError, TodoError};
pub use filter::{ListFilter, DEFAULT_LIMIT, MAX_LIMIT};
pub use id::{IdError, TodoId};
pub use sort::{SortField, SortOrder};
pub use status::Status;
pub use todo::{Todo, TodoRecord, UpdateTodo};
pub use validate::{
    English, FieldError, Measure, Rule, Translator, ValidationErrors, Validator,
    DESCRIPTION_MAX_CHARS, LABELS_MAX_ITEMS, TITLE_MAX_CHARS,
};
