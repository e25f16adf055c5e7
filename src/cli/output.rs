//! Output formatting for CLI commands

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::Todo;
use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints an error message, with per-field details when there are any
    pub fn error(&self, message: &str, fields: Option<&BTreeMap<String, String>>) {
        match self.format {
            OutputFormat::Text => {
                eprintln!("Error: {}", message);
                for (field, reason) in fields.into_iter().flatten() {
                    eprintln!("  {}: {}", field, reason);
                }
            }
            OutputFormat::Json => {
                let mut body = serde_json::json!({
                    "success": false,
                    "error": message
                });
                if let Some(fields) = fields {
                    body["fields"] = serde_json::json!(fields);
                }
                eprintln!("{}", body);
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        let json = match self.format {
            OutputFormat::Text => serde_json::to_string_pretty(data),
            OutputFormat::Json => serde_json::to_string(data),
        };
        if let Ok(json) = json {
            println!("{}", json);
        }
    }

    /// Prints one todo as a detail block, or as JSON
    pub fn todo(&self, todo: &Todo) {
        if self.is_json() {
            self.data(todo);
            return;
        }

        println!("ID:          {}", todo.id());
        println!("Title:       {}", todo.title());
        if !todo.description().is_empty() {
            println!("Description: {}", todo.description());
        }
        println!("Status:      {}", todo.status());
        if !todo.labels().is_empty() {
            println!("Labels:      [{}]", todo.labels().join(", "));
        }
        println!("Created:     {}", todo.create_time().to_rfc3339());
        println!("Updated:     {}", todo.update_time().to_rfc3339());
    }

    /// Prints todos as a table, or as a JSON array
    pub fn todos(&self, todos: &[Todo]) {
        if self.is_json() {
            self.data(&todos);
            return;
        }

        if todos.is_empty() {
            println!("No todos found.");
            return;
        }

        println!("{:<36}  {:<11}  {:<20}  TITLE", "ID", "STATUS", "LABELS");
        println!("{}", "-".repeat(90));
        for todo in todos {
            println!(
                "{:<36}  {:<11}  {:<20}  {}",
                todo.id(),
                todo.status(),
                todo.labels().join(","),
                todo.title()
            );
        }
        println!();
        println!("{} todo(s)", todos.len());
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
