//! Persistence contract the service depends on

use crate::context::CallContext;
use crate::domain::{ListFilter, Todo, TodoError, TodoId};

use super::health::HealthInfo;

/// Storage for todos.
///
/// Implementations must honor the [`CallContext`] on every call: stop
/// promptly with [`TodoError::Cancelled`] or [`TodoError::DeadlineExceeded`]
/// once it says so. Retrying transient failures, if any, happens here and
/// never in the service. `list` and `count` translate the filter through
/// [`SearchRequest`](super::SearchRequest) so every backend applies the same
/// predicate semantics.
pub trait Repository {
    /// Reports backend health
    fn health(&self, ctx: &CallContext) -> Result<HealthInfo, TodoError>;

    /// Persists a new todo; [`TodoError::Conflict`] if the ID is taken
    fn create(&self, ctx: &CallContext, todo: &Todo) -> Result<(), TodoError>;

    /// Fetches a todo; [`TodoError::NotFound`] if it does not exist
    fn get(&self, ctx: &CallContext, id: &TodoId) -> Result<Todo, TodoError>;

    /// Replaces a stored todo; [`TodoError::NotFound`] if it does not exist
    fn update(&self, ctx: &CallContext, todo: &Todo) -> Result<(), TodoError>;

    /// Removes a todo; [`TodoError::NotFound`] if it does not exist
    fn delete(&self, ctx: &CallContext, id: &TodoId) -> Result<(), TodoError>;

    /// Returns the page of todos matching the filter
    fn list(&self, ctx: &CallContext, filter: &ListFilter) -> Result<Vec<Todo>, TodoError>;

    /// Counts every todo matching the filter, ignoring pagination and sort
    fn count(&self, ctx: &CallContext, filter: &ListFilter) -> Result<u64, TodoError>;
}
