//! Database CLI commands

use anyhow::Result;

use super::app::Session;
use super::output::Output;
use crate::storage::SqliteRepository;

pub fn health(session: &Session, output: &Output) -> Result<()> {
    let info = session.service.health(&session.context())?;

    if output.is_json() {
        output.data(&info);
        return Ok(());
    }

    println!("Database Health");
    println!("{}", "=".repeat(40));
    println!("Status:        {}", info.status.as_str());
    println!("Available:     {}", if info.available { "yes" } else { "no" });
    println!(
        "Response time: {:.2}ms",
        info.response_time.as_secs_f64() * 1000.0
    );
    if let Some(version) = &info.version {
        println!("Version:       SQLite {}", version);
    }
    if let Some(connections) = info.active_connections {
        println!("Connections:   {}", connections);
    }
    if !info.details.is_empty() {
        println!();
        println!("Details:");
        for (key, value) in &info.details {
            match value.as_str() {
                Some(s) => println!("  {}: {}", key, s),
                None => println!("  {}: {}", key, value),
            }
        }
    }

    if !info.available {
        anyhow::bail!("database is {}", info.status.as_str());
    }
    Ok(())
}

pub fn migrate(session: &Session, output: &Output) -> Result<()> {
    let repo = session.service.repository();
    repo.migrate()?;
    let version = repo.schema_version()?;
    let path = repo
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    if output.is_json() {
        output.data(&serde_json::json!({
            "migrated": true,
            "schema_version": version,
            "path": path,
        }));
    } else {
        output.success(&format!(
            "Database at {} is at schema version {} (latest {})",
            path,
            version,
            SqliteRepository::SCHEMA_VERSION
        ));
    }

    Ok(())
}
