//! UQL, a pipe-style query language for semi-structured data.
//!
//! A query is a list of stages separated by `|`. Each stage takes the value
//! produced by the previous one:
//!
//! ```
//! use uql_lang::{Value, run_query};
//! use serde_json::json;
//!
//! let input = Value::from(json!([
//!     {"team": "x", "score": 3},
//!     {"team": "x", "score": 5},
//!     {"team": "y", "score": 1},
//! ]));
//!
//! let result = run_query(
//!     r#"summarize "n"=count(), "best"=max("score") by "team""#,
//!     Some(input),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     result,
//!     Value::from(json!([
//!         {"team": "x", "n": 2, "best": 5},
//!         {"team": "y", "n": 1, "best": 1},
//!     ]))
//! );
//! ```

pub mod adapters;
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod convert;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod summarize;
pub mod value;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use adapters::AdapterError;
pub use ast::{Stage, Token};
pub use evaluator::{Accumulator, EvalError, Evaluator};
pub use expression::{Evaluated, ExpressionEngine, JsonataEngine, Sequence};
pub use functions::{Operator, UnknownOperator};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse_query};
pub use value::{Map, Value};

/// Returned for a query with no stages at all.
pub const EMPTY_QUERY_MESSAGE: &str = "hello there! provide a valid query";

/// Errors returned by [`run_query`] and [`Uql::run`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Query runner holding the evaluator configuration.
///
/// ```
/// use uql_lang::{Uql, Value};
///
/// let uql = Uql::new();
/// let result = uql.run("echo 'abc' | toupper", None).unwrap();
/// assert_eq!(result, Value::from("ABC"));
/// ```
#[derive(Clone, Default)]
pub struct Uql {
    evaluator: Evaluator,
}

impl Uql {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `engine` for `jsonata` stages.
    pub fn with_engine(engine: Arc<dyn ExpressionEngine + Send + Sync>) -> Self {
        Uql {
            evaluator: Evaluator::with_engine(engine),
        }
    }

    /// Parse `query` and run it over `input` (`null` when absent).
    pub fn run(&self, query: &str, input: Option<Value>) -> Result<Value, QueryError> {
        if query.trim().is_empty() {
            debug!("empty query");
            return Ok(Value::from(EMPTY_QUERY_MESSAGE));
        }
        let stages = parse_query(query)?;
        debug!(stages = stages.len(), "parsed query");
        Ok(self.evaluator.eval_stages(&stages, input.unwrap_or_default())?)
    }
}

/// Run `query` over `input` with the built-in expression engine.
pub fn run_query(query: &str, input: Option<Value>) -> Result<Value, QueryError> {
    Uql::new().run(query, input)
}
