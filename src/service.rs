//! Todo service
//!
//! The single entry point front ends use. Every operation validates its
//! inputs before touching the repository, delegates state changes to the
//! [`Todo`] aggregate, and hands the caller's [`CallContext`] unchanged to
//! each repository call. The service never retries.
//!
//! Error policy: not-found, conflict, cancellation and deadline errors from
//! the repository pass through as they are; backend failures gain a short
//! description of the operation that failed.

use tracing::{debug, info};

use crate::context::CallContext;
use crate::domain::{ListFilter, Status, Todo, TodoError, TodoId, UpdateTodo, Validator};
use crate::storage::{HealthInfo, Repository};

/// Application service for todos
#[derive(Debug)]
pub struct TodoService<R> {
    repo: R,
    validator: Validator,
}

impl<R: Repository> TodoService<R> {
    /// Creates a service with the default English validator
    pub fn new(repo: R) -> Self {
        Self::with_validator(repo, Validator::new())
    }

    pub fn with_validator(repo: R, validator: Validator) -> Self {
        Self { repo, validator }
    }

    /// The underlying repository
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Reports the health of the backing store
    #[tracing::instrument(skip_all)]
    pub fn health(&self, ctx: &CallContext) -> Result<HealthInfo, TodoError> {
        self.repo
            .health(ctx)
            .map_err(|e| e.context("health check failed"))
    }

    /// Creates and persists a new pending todo
    #[tracing::instrument(skip(self, ctx, description, labels))]
    pub fn create_todo(
        &self,
        ctx: &CallContext,
        title: &str,
        description: &str,
        labels: Vec<String>,
    ) -> Result<Todo, TodoError> {
        let todo = Todo::new(title, description, labels)?;

        self.repo
            .create(ctx, &todo)
            .map_err(|e| e.context("failed to create todo"))?;

        info!(id = %todo.id(), "created todo");
        Ok(todo)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub fn get_todo(&self, ctx: &CallContext, id: &str) -> Result<Todo, TodoError> {
        let id: TodoId = id.parse()?;
        self.repo.get(ctx, &id)
    }

    /// Applies a partial update. An invalid patch never reaches the
    /// repository's `update`.
    #[tracing::instrument(skip(self, ctx, patch))]
    pub fn update_todo(
        &self,
        ctx: &CallContext,
        id: &str,
        patch: UpdateTodo,
    ) -> Result<Todo, TodoError> {
        let id: TodoId = id.parse()?;

        let mut todo = self.repo.get(ctx, &id)?;
        todo.apply_update(patch, &self.validator)?;

        self.repo
            .update(ctx, &todo)
            .map_err(|e| e.context("failed to update todo"))?;

        info!(id = %id, "updated todo");
        Ok(todo)
    }

    /// Moves a todo to `status`, given as its string form
    #[tracing::instrument(skip(self, ctx))]
    pub fn change_status(
        &self,
        ctx: &CallContext,
        id: &str,
        status: &str,
    ) -> Result<Todo, TodoError> {
        let id: TodoId = id.parse()?;
        let status: Status = status.parse()?;

        let mut todo = self.repo.get(ctx, &id)?;
        let previous = todo.status();
        todo.change_status(status)?;

        self.repo
            .update(ctx, &todo)
            .map_err(|e| e.context("failed to update todo status"))?;

        info!(id = %id, from = %previous, to = %status, "changed todo status");
        Ok(todo)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub fn delete_todo(&self, ctx: &CallContext, id: &str) -> Result<(), TodoError> {
        let id: TodoId = id.parse()?;

        self.repo
            .delete(ctx, &id)
            .map_err(|e| e.context("failed to delete todo"))?;

        info!(id = %id, "deleted todo");
        Ok(())
    }

    /// Lists todos. Limit and sort defaults are filled in here and only here.
    #[tracing::instrument(skip_all)]
    pub fn list_todos(&self, ctx: &CallContext, filter: &ListFilter) -> Result<Vec<Todo>, TodoError> {
        filter.validate()?;
        let filter = filter.with_defaults();
        debug!(?filter, "listing todos");

        self.repo
            .list(ctx, &filter)
            .map_err(|e| e.context("failed to list todos"))
    }

    /// Counts todos matching the filter; pagination and sort are ignored
    #[tracing::instrument(skip_all)]
    pub fn count_todos(&self, ctx: &CallContext, filter: &ListFilter) -> Result<u64, TodoError> {
        filter.validate()?;

        self.repo
            .count(ctx, filter)
            .map_err(|e| e.context("failed to count todos"))
    }
}
