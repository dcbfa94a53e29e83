//! Execute queries for `uql run`

use super::CliError;
use crate::{QueryError, Uql, Value, parse_query};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The query to execute
    pub query: String,
    /// Input text
    pub input: Option<String>,
    /// Parse the input as JSON instead of passing it on as a string
    pub json_input: bool,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed successfully
    Success(Value),
}

/// Execute `uql run`.
///
/// The input enters the pipeline as a string (so `parse-csv` and friends can
/// read it) unless `json_input` is set.
pub fn execute_run(options: &RunOptions) -> Result<RunResult, CliError> {
    if options.syntax_only {
        if !options.query.trim().is_empty() {
            parse_query(&options.query).map_err(QueryError::from)?;
        }
        return Ok(RunResult::SyntaxValid);
    }

    let input = match (&options.input, options.json_input) {
        (Some(text), true) => Some(Value::from(serde_json::from_str::<serde_json::Value>(text)?)),
        (Some(text), false) => Some(Value::String(text.clone())),
        (None, true) => return Err(CliError::NoInput),
        (None, false) => None,
    };

    let output = Uql::new().run(&options.query, input)?;
    Ok(RunResult::Success(output))
}
