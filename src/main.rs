//! todoify - a searchable todo list

use std::process::ExitCode;

fn main() -> ExitCode {
    todoify::cli::run()
}
