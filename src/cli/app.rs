//! Main CLI application structure

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::output::Output;
use super::todo::{FilterArgs, PageArgs};
use super::{db_cmd, todo};
use crate::context::CallContext;
use crate::domain::{TodoError, UpdateTodo};
use crate::service::TodoService;
use crate::storage::{Config, OutputFormat, SqliteRepository};

#[derive(Parser)]
#[command(name = "todoify")]
#[command(author, version, about = "Searchable todo list backed by SQLite")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format, else text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Deadline for each operation in milliseconds (0 disables it)
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new todo
    ///
    /// Examples:
    ///   todoify create "Buy milk"
    ///   todoify create "Fix login" -d "SSO users are rejected" -l bug,urgent
    #[command(visible_alias = "c")]
    Create {
        /// Todo title
        title: String,

        /// Longer description
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Labels (comma-separated)
        #[arg(long, short = 'l', value_delimiter = ',')]
        labels: Vec<String>,
    },

    /// Show a todo
    Get {
        /// Todo ID
        id: String,
    },

    /// Update title, description or labels of a todo
    #[command(visible_alias = "u")]
    #[command(group(
        ArgGroup::new("fields")
            .required(true)
            .multiple(true)
            .args(["title", "description", "labels"])
    ))]
    Update {
        /// Todo ID
        id: String,

        /// New title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// New description (an empty string clears it)
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// New labels (comma-separated, replaces the existing ones)
        #[arg(long, short = 'l', value_delimiter = ',')]
        labels: Option<Vec<String>>,
    },

    /// Change the status of a todo
    ///
    /// Valid statuses: pending, in_progress, completed, cancelled, blocked
    #[command(visible_alias = "m")]
    Mark {
        /// Todo ID
        id: String,

        /// New status
        status: String,
    },

    /// Delete a todo
    #[command(visible_alias = "d")]
    Delete {
        /// Todo ID
        id: String,
    },

    /// List todos with optional filtering, sorting, and pagination
    ///
    /// Examples:
    ///   todoify list --status pending
    ///   todoify list --labels bug,urgent --search "login"
    ///   todoify list --limit 10 --offset 20 --sort-by title --sort-order asc
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Count todos matching a filter
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Check database health
    Health,

    /// Create or upgrade the database schema
    Migrate,
}

/// Everything a command needs to talk to the store
pub struct Session {
    pub service: TodoService<SqliteRepository>,
    timeout: Option<Duration>,
}

impl Session {
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.db_path();
        let repo = SqliteRepository::open(&path, config.busy_timeout())
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        Ok(Self {
            service: TodoService::new(repo),
            timeout: config.timeout(),
        })
    }

    /// A fresh context for one operation, carrying the configured deadline
    pub fn context(&self) -> CallContext {
        match self.timeout {
            Some(timeout) => CallContext::with_timeout(timeout),
            None => CallContext::background(),
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "todoify=debug" } else { "todoify=warn" };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Resolves configuration: file, then environment, then flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(db) = &cli.db {
        config.storage.db_path = Some(db.clone());
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = Some(ms);
    }
    if let Some(format) = cli.format {
        config.default_format = format;
    }

    Ok(config)
}

/// Main entry point for the CLI. Failures are reported here and turned
/// into an exit code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report(&Output::new(cli.format.unwrap_or_default()), &e);
            return ExitCode::FAILURE;
        }
    };
    debug!(db = %config.db_path().display(), timeout = ?config.timeout(), "loaded configuration");

    let output = Output::new(config.default_format);
    let result = Session::open(&config).and_then(|session| dispatch(cli.command, &session, &output));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&output, &e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn dispatch(command: Commands, session: &Session, output: &Output) -> Result<()> {
    match command {
        Commands::Create {
            title,
            description,
            labels,
        } => todo::create(session, output, &title, &description, labels),

        Commands::Get { id } => todo::get(session, output, &id),

        Commands::Update {
            id,
            title,
            description,
            labels,
        } => {
            let patch = UpdateTodo {
                title,
                description,
                labels,
            };
            todo::update(session, output, &id, patch)
        }

        Commands::Mark { id, status } => todo::mark(session, output, &id, &status),
        Commands::Delete { id } => todo::delete(session, output, &id),
        Commands::List { filter, page } => todo::list(session, output, filter, page),
        Commands::Count { filter } => todo::count(session, output, filter),
        Commands::Health => db_cmd::health(session, output),
        Commands::Migrate => db_cmd::migrate(session, output),
    }
}

fn report(output: &Output, err: &anyhow::Error) {
    let fields = err
        .downcast_ref::<TodoError>()
        .and_then(TodoError::field_errors);
    output.error(&format!("{:#}", err), fields);
}

/// Process exit code for a failed run
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TodoError>() {
        Some(TodoError::InvalidInput { .. } | TodoError::InvalidStatus(_)) => 2,
        Some(TodoError::NotFound(_)) => 3,
        Some(TodoError::Conflict(_)) => 4,
        Some(TodoError::Cancelled | TodoError::DeadlineExceeded) => 5,
        _ => 1,
    }
}
