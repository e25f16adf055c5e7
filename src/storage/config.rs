//! Configuration handling for todoify
//!
//! Configuration is read from `config.toml` in the platform config
//! directory (or the file given with `--config`). `TODOIFY_DB_PATH` and
//! `TODOIFY_TIMEOUT_MS` override the file; command-line flags override both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sqlite::DEFAULT_BUSY_TIMEOUT;

/// Environment variable overriding the database path
pub const ENV_DB_PATH: &str = "TODOIFY_DB_PATH";
/// Environment variable overriding the per-call timeout, in milliseconds
pub const ENV_TIMEOUT_MS: &str = "TODOIFY_TIMEOUT_MS";

const DB_FILE_NAME: &str = "todoify.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to `todoify.db` in the platform data directory
    pub db_path: Option<PathBuf>,

    /// How long to wait on a locked database
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Deadline for each operation; none when unset or zero
    pub timeout_ms: Option<u64>,

    pub storage: StorageConfig,
}

impl Config {
    /// Returns the platform config directory
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the default location of `config.toml`
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "todoify", "todoify")
    }

    /// Loads configuration and applies environment overrides.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path)?,
                _ => Self::default(),
            },
        };

        config
            .apply_overrides(|key| std::env::var(key).ok())
            .context("Failed to apply environment overrides")?;

        Ok(config)
    }

    /// Loads configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies overrides looked up by variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            self.storage.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS).filter(|t| !t.is_empty()) {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    ENV_TIMEOUT_MS, raw
                ))
            })?;
            self.timeout_ms = Some(ms);
        }

        Ok(())
    }

    /// Resolved database path
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.db_path {
            return path.clone();
        }

        match Self::project_dirs() {
            Some(dirs) => dirs.data_dir().join(DB_FILE_NAME),
            None => PathBuf::from(DB_FILE_NAME),
        }
    }

    /// Per-operation deadline, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = Config::default();

        assert_eq!(config.default_format, OutputFormat::Text);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.db_path().ends_with("todoify.db"));
    }

    #[test]
    fn parse_config() {
        let toml = r#"
default_format = "json"
timeout_ms = 2500

[storage]
db_path = "/tmp/todos.db"
busy_timeout_ms = 100
"#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/todos.db"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::from_toml("[storage]\ndb_path = \"x.db\"\n").unwrap();
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_error() {
        let err = Config::from_toml("default_format = \"yaml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let config = Config {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::from_toml("timeout_ms = 10\n").unwrap();
        config
            .apply_overrides(env(&[
                (ENV_DB_PATH, "/data/todos.db"),
                (ENV_TIMEOUT_MS, "750"),
            ]))
            .unwrap();

        assert_eq!(config.db_path(), PathBuf::from("/data/todos.db"));
        assert_eq!(config.timeout(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn bad_timeout_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_format = \"json\"\n").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_file(&dir.path().join("absent.toml")).is_err());
    }
}
