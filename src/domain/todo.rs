//! Todo domain model
//!
//! A [`Todo`] is the aggregate root: it can only be built through
//! [`Todo::new`] (or rehydrated from a [`TodoRecord`], which re-checks the
//! invariants) and only changes through [`Todo::apply_update`] and
//! [`Todo::change_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TodoError;
use super::id::TodoId;
use super::status::Status;
use super::validate::Validator;

/// Partial update of a todo.
///
/// `None` leaves a field unchanged; `Some` replaces it, including with an
/// empty string or list (which the validator may then reject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl UpdateTodo {
    /// Returns true if the patch names no field
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.labels.is_none()
    }
}

/// Plain stored form of a todo, as read from or written to a backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub status: Status,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// A todo item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TodoRecord", into = "TodoRecord")]
pub struct Todo {
    id: TodoId,
    title: String,
    description: String,
    labels: Vec<String>,
    status: Status,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl Todo {
    /// Creates a new pending todo with a fresh ID
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        labels: Vec<String>,
    ) -> Result<Self, TodoError> {
        let title = title.into();
        if title.is_empty() {
            return Err(TodoError::invalid_input("title is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: TodoId::new(),
            title,
            description: description.into(),
            labels,
            status: Status::Pending,
            create_time: now,
            update_time: now,
        })
    }

    pub fn id(&self) -> TodoId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Description, empty when none was given
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn update_time(&self) -> DateTime<Utc> {
        self.update_time
    }

    /// Returns true if the todo is completed
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Applies a patch. The whole patch is validated first; on failure
    /// nothing is changed.
    pub fn apply_update(&mut self, patch: UpdateTodo, validator: &Validator) -> Result<(), TodoError> {
        validator.check(&patch)?;

        if let Some(title) = patch.title {
            self.title = title;
        }

        if let Some(description) = patch.description {
            self.description = description;
        }

        if let Some(labels) = patch.labels {
            self.labels = labels;
        }

        self.touch();
        Ok(())
    }

    /// Transitions to a new status
    pub fn change_status(&mut self, new_status: Status) -> Result<(), TodoError> {
        if !self.status.can_transition_to(new_status) {
            return Err(TodoError::InvalidStatus(format!(
                "cannot move a {} todo to {}",
                self.status, new_status
            )));
        }

        self.status = new_status;
        self.touch();
        Ok(())
    }

    /// Refreshes the update time, never letting it fall behind the create time
    fn touch(&mut self) {
        self.update_time = Utc::now().max(self.create_time);
    }
}

impl TryFrom<TodoRecord> for Todo {
    type Error = TodoError;

    fn try_from(record: TodoRecord) -> Result<Self, Self::Error> {
        if record.title.is_empty() {
            return Err(TodoError::invalid_input(format!(
                "stored todo {} has an empty title",
                record.id
            )));
        }
        if record.update_time < record.create_time {
            return Err(TodoError::invalid_input(format!(
                "stored todo {} was updated before it was created",
                record.id
            )));
        }

        Ok(Self {
            id: record.id,
            title: record.title,
            description: record.description,
            labels: record.labels,
            status: record.status,
            create_time: record.create_time,
            update_time: record.update_time,
        })
    }
}

impl From<Todo> for TodoRecord {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            labels: todo.labels,
            status: todo.status,
            create_time: todo.create_time,
            update_time: todo.update_time,
        }
    }
}

impl From<&Todo> for TodoRecord {
    fn from(todo: &Todo) -> Self {
        todo.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn make_todo() -> Todo {
        Todo::new("Buy milk", "Semi-skimmed", vec!["errand".to_string()]).unwrap()
    }

    #[test]
    fn new_todo_is_pending_with_equal_timestamps() {
        let todo = make_todo();
        assert_eq!(todo.status(), Status::Pending);
        assert_eq!(todo.create_time(), todo.update_time());
        assert_eq!(todo.title(), "Buy milk");
        assert_eq!(todo.labels(), ["errand".to_string()]);
        assert!(!todo.is_completed());
    }

    #[test]
    fn empty_title_fails() {
        let err = Todo::new("", "description", vec![]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn apply_update_replaces_present_fields_only() {
        let mut todo = make_todo();
        let patch = UpdateTodo {
            title: Some("Buy oat milk".to_string()),
            ..Default::default()
        };

        todo.apply_update(patch, &Validator::new()).unwrap();

        assert_eq!(todo.title(), "Buy oat milk");
        assert_eq!(todo.description(), "Semi-skimmed");
        assert_eq!(todo.labels(), ["errand".to_string()]);
    }

    #[test]
    fn apply_update_can_clear_description() {
        let mut todo = make_todo();
        let patch = UpdateTodo {
            description: Some(String::new()),
            ..Default::default()
        };

        todo.apply_update(patch, &Validator::new()).unwrap();
        assert_eq!(todo.description(), "");
    }

    #[test]
    fn invalid_patch_changes_nothing() {
        let mut todo = make_todo();
        let before = todo.clone();
        let patch = UpdateTodo {
            title: Some("Valid new title".to_string()),
            labels: Some((0..11).map(|i| format!("l{}", i)).collect()),
            ..Default::default()
        };

        let err = todo.apply_update(patch, &Validator::new()).unwrap_err();

        assert!(err.is_invalid_input());
        assert!(err.field_errors().unwrap().contains_key("labels"));
        assert_eq!(todo, before);
    }

    #[test]
    fn empty_patch_only_refreshes_update_time() {
        let mut todo = make_todo();
        let before = todo.clone();

        sleep(Duration::from_millis(10));
        todo.apply_update(UpdateTodo::default(), &Validator::new())
            .unwrap();

        assert!(todo.update_time() > before.update_time());
        assert_eq!(todo.title(), before.title());
        assert_eq!(todo.description(), before.description());
        assert_eq!(todo.labels(), before.labels());
        assert_eq!(todo.status(), before.status());
        assert_eq!(todo.create_time(), before.create_time());
    }

    #[test]
    fn completed_cannot_be_blocked() {
        let mut todo = make_todo();
        todo.change_status(Status::Completed).unwrap();
        let before = todo.clone();

        let err = todo.change_status(Status::Blocked).unwrap_err();

        assert!(err.is_invalid_status());
        assert_eq!(todo, before);
    }

    #[test]
    fn completed_can_move_anywhere_else() {
        for next in [
            Status::Pending,
            Status::InProgress,
            Status::Completed,
            Status::Cancelled,
        ] {
            let mut todo = make_todo();
            todo.change_status(Status::Completed).unwrap();
            todo.change_status(next).unwrap();
            assert_eq!(todo.status(), next);
        }
    }

    #[test]
    fn change_status_refreshes_update_time() {
        let mut todo = make_todo();
        let before = todo.update_time();

        sleep(Duration::from_millis(10));
        todo.change_status(Status::InProgress).unwrap();

        assert!(todo.update_time() > before);
        assert!(!todo.is_completed());

        todo.change_status(Status::Completed).unwrap();
        assert!(todo.is_completed());
    }

    #[test]
    fn serde_roundtrip_uses_camel_case() {
        let todo = make_todo();
        let json = serde_json::to_value(&todo).unwrap();

        assert!(json.get("createTime").is_some());
        assert!(json.get("updateTime").is_some());
        assert_eq!(json["status"], "pending");

        let parsed: Todo = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, todo);
    }

    #[test]
    fn serde_omits_empty_optional_fields() {
        let todo = Todo::new("Bare", "", vec![]).unwrap();
        let json = serde_json::to_value(&todo).unwrap();

        assert!(json.get("description").is_none());
        assert!(json.get("labels").is_none());
    }

    #[test]
    fn deserialize_rejects_broken_invariants() {
        let id = TodoId::new();
        let json = format!(
            r#"{{"id":"{}","title":"","status":"pending","createTime":"2025-01-01T00:00:00Z","updateTime":"2025-01-01T00:00:00Z"}}"#,
            id
        );
        assert!(serde_json::from_str::<Todo>(&json).is_err());

        let json = format!(
            r#"{{"id":"{}","title":"Late","status":"pending","createTime":"2025-01-02T00:00:00Z","updateTime":"2025-01-01T00:00:00Z"}}"#,
            id
        );
        assert!(serde_json::from_str::<Todo>(&json).is_err());

        let json = format!(
            r#"{{"id":"{}","title":"Odd","status":"done","createTime":"2025-01-01T00:00:00Z","updateTime":"2025-01-01T00:00:00Z"}}"#,
            id
        );
        assert!(serde_json::from_str::<Todo>(&json).is_err());
    }

    proptest! {
        #[test]
        fn any_non_empty_title_creates_pending_todo(title in ".{1,255}") {
            let a = Todo::new(title.clone(), "", vec![]).unwrap();
            let b = Todo::new(title.clone(), "", vec![]).unwrap();

            prop_assert_eq!(a.status(), Status::Pending);
            prop_assert_eq!(a.create_time(), a.update_time());
            prop_assert_eq!(a.title(), title.as_str());
            prop_assert_ne!(a.id(), b.id());
        }

        #[test]
        fn update_time_never_precedes_create_time(steps in proptest::collection::vec(0usize..5, 0..20)) {
            let mut todo = make_todo();
            for step in steps {
                let _ = todo.change_status(Status::ALL[step]);
                prop_assert!(todo.update_time() >= todo.create_time());
            }
        }
    }
}
