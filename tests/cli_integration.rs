//! CLI integration tests for todoify
//!
//! These tests drive the binary against a temporary database, checking that
//! commands work together and that failures are reported usefully.

use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get a command instance for the todoify binary, isolated from the
/// caller's environment
fn todoify_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("todoify"));
    cmd.env_remove("TODOIFY_DB_PATH")
        .env_remove("TODOIFY_TIMEOUT_MS")
        .env_remove("RUST_LOG");
    cmd
}

/// A temporary directory holding the database
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("todos.db")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = todoify_cmd();
        cmd.arg("--db").arg(self.db());
        cmd
    }

    /// Runs a command with `--format json` and parses its stdout
    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).unwrap()
    }

    /// Creates a todo and returns its ID
    fn create(&self, args: &[&str]) -> String {
        let mut full = vec!["create"];
        full.extend_from_slice(args);
        self.json(&full)["id"].as_str().unwrap().to_string()
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_create_get_mark_list_delete() {
    let ws = Workspace::new();

    let id = ws.create(&["Buy milk", "-d", "Two litres", "-l", "home,errand"]);

    let todo = ws.json(&["get", &id]);
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["description"], "Two litres");
    assert_eq!(todo["labels"], serde_json::json!(["home", "errand"]));
    assert_eq!(todo["status"], "pending");
    assert_eq!(todo["createTime"], todo["updateTime"]);

    ws.cmd()
        .args(["mark", &id, "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked"))
        .stdout(predicate::str::contains("completed"));

    let listed = ws.json(&["list", "--status", "completed"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    ws.cmd()
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted todo"));

    ws.cmd()
        .args(["get", &id])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("todo not found"));
}

#[test]
fn test_completed_todo_cannot_be_blocked() {
    let ws = Workspace::new();
    let id = ws.create(&["Ship release"]);

    ws.cmd().args(["mark", &id, "completed"]).assert().success();

    ws.cmd()
        .args(["mark", &id, "blocked"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid status transition"));

    assert_eq!(ws.json(&["get", &id])["status"], "completed");
}

#[test]
fn test_invalid_status_names_valid_set() {
    let ws = Workspace::new();
    let id = ws.create(&["Task"]);

    ws.cmd()
        .args(["mark", &id, "done"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'done'"))
        .stderr(predicate::str::contains(
            "pending, in_progress, completed, cancelled, blocked",
        ));
}

#[test]
fn test_update_changes_fields() {
    let ws = Workspace::new();
    let id = ws.create(&["Draft", "-l", "a"]);

    ws.cmd()
        .args(["update", &id, "--title", "Final", "--labels", "b,c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated todo"));

    let todo = ws.json(&["get", &id]);
    assert_eq!(todo["title"], "Final");
    assert_eq!(todo["labels"], serde_json::json!(["b", "c"]));
}

#[test]
fn test_update_with_empty_title_prints_field_errors() {
    let ws = Workspace::new();
    let id = ws.create(&["Keep me"]);

    ws.cmd()
        .args(["update", &id, "--title", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("title: title must be at least 1 character"));

    assert_eq!(ws.json(&["get", &id])["title"], "Keep me");
}

#[test]
fn test_update_requires_a_field() {
    let ws = Workspace::new();
    let id = ws.create(&["Task"]);

    ws.cmd().args(["update", &id]).assert().failure();
}

#[test]
fn test_malformed_id_is_invalid_input() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["get", "not-a-uuid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid id format"));
}

#[test]
fn test_create_requires_title() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["create", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("title is required"));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_list_filters_by_all_labels() {
    let ws = Workspace::new();
    ws.create(&["Both", "-l", "home,urgent"]);
    ws.create(&["Home only", "-l", "home"]);
    ws.create(&["Neither"]);

    let listed = ws.json(&["list", "--labels", "home,urgent"]);
    let titles: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Both"]);

    assert_eq!(ws.json(&["count", "--labels", "home"])["count"], 2);
    assert_eq!(ws.json(&["count"])["count"], 3);
}

#[test]
fn test_list_search_and_sort() {
    let ws = Workspace::new();
    ws.create(&["banana bread"]);
    ws.create(&["apple pie", "-d", "with cinnamon"]);
    ws.create(&["cherry tart"]);

    let found = ws.json(&["list", "--search", "cinnamon"]);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "apple pie");

    let sorted = ws.json(&["list", "--sort-by", "title", "--sort-order", "asc"]);
    let titles: Vec<_> = sorted
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["apple pie", "banana bread", "cherry tart"]);
}

#[test]
fn test_list_pagination() {
    let ws = Workspace::new();
    for title in ["a", "b", "c", "d"] {
        ws.create(&[title]);
    }

    let page = ws.json(&[
        "list", "--sort-by", "title", "--sort-order", "asc", "--limit", "2", "--offset", "1",
    ]);
    let titles: Vec<_> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["b", "c"]);
}

#[test]
fn test_list_rejects_unknown_sort_field() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["list", "--sort-by", "priority"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'priority'"))
        .stderr(predicate::str::contains("createTime"));
}

#[test]
fn test_list_rejects_bad_date() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["list", "--from-date", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn test_list_empty_text() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No todos found."));
}

// =============================================================================
// Database and configuration
// =============================================================================

#[test]
fn test_health_reports_healthy() {
    let ws = Workspace::new();

    let health = ws.json(&["health"]);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["available"], true);
    assert!(health["responseTime"].is_number());
    assert_eq!(health["details"]["todoCount"], 0);
}

#[test]
fn test_migrate_is_idempotent() {
    let ws = Workspace::new();

    for _ in 0..2 {
        let result = ws.json(&["migrate"]);
        assert_eq!(result["migrated"], true);
        assert_eq!(result["schema_version"], 1);
    }
    assert!(ws.db().exists());
}

#[test]
fn test_config_file_sets_format_and_db() {
    let ws = Workspace::new();
    let db = ws.path().join("from-config.db");
    let config = ws.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "default_format = \"json\"\n\n[storage]\ndb_path = {:?}\n",
            db.display().to_string()
        ),
    )
    .unwrap();

    let output = todoify_cmd()
        .arg("--config")
        .arg(&config)
        .args(["create", "From config"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let todo: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(todo["title"], "From config");
    assert!(db.exists());
}

#[test]
fn test_env_sets_db_path() {
    let ws = Workspace::new();
    let db = ws.path().join("from-env.db");

    todoify_cmd()
        .env("TODOIFY_DB_PATH", &db)
        .args(["create", "From env"])
        .assert()
        .success();

    assert!(db.exists());
}

#[test]
fn test_missing_config_file_fails() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("--config")
        .arg(ws.path().join("absent.toml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}
