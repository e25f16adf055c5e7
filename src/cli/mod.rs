//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `create`, `get`, `update`, `mark`, `delete` | Single todo lifecycle |
//! | `list`, `count` | Filtered queries |
//! | `health`, `migrate` | Database maintenance |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr. `--verbose` enables debug logs for todoify;
//! `RUST_LOG` takes precedence:
//! ```bash
//! RUST_LOG=todoify=trace todoify list
//! ```
//!
//! ## Exit Codes
//!
//! `0` success, `1` other failure, `2` invalid input or status, `3` not
//! found, `4` conflict, `5` cancelled or timed out.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod db_cmd;
mod output;
mod todo;

pub use app::{exit_code, run, Cli, Commands, Session};
pub use output::Output;
