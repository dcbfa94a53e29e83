//! CLI support for uql-lang
//!
//! The `uql` binary is a thin wrapper over these functions, so they can also
//! be called from other tools.

mod functions;
mod run;

pub use functions::functions_overview;
pub use run::{RunOptions, RunResult, execute_run};

use std::io;

use thiserror::Error;

use crate::QueryError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Query failed to parse or run
    #[error(transparent)]
    Query(#[from] QueryError),

    /// `--json` input is not valid JSON
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// `--json` was given without any input
    #[error("no input provided; use --input or pipe data to stdin")]
    NoInput,
}
