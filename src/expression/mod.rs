//! The expression language behind the `jsonata` stage.
//!
//! Expressions navigate and reshape the current value:
//!
//! ```text
//! orders[total > 100].customer.name
//! $sum(items.(price * quantity))
//! { "names": people.name, "count": $count(people) }
//! ```
//!
//! The pipeline only depends on [`ExpressionEngine`]; [`JsonataEngine`] is the
//! built-in implementation.

mod eval;
mod lexer;
mod parser;

use tracing::debug;

use crate::adapters::AdapterError;
use crate::value::Value;

/// A multi-item result of a path expression.
///
/// Sequences are an engine-level notion. The pipeline keeps only `items`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub items: Vec<Value>,
    /// Set when the expression asked for an array even for a single item
    /// (`path[]`)
    pub keep_singleton: bool,
}

/// What an expression evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value(Value),
    Sequence(Sequence),
}

pub trait ExpressionEngine {
    /// Evaluate `expr` with `input` as both the context (`$`) and the root
    /// (`$$`).
    fn evaluate(&self, expr: &str, input: &Value) -> Result<Evaluated, AdapterError>;
}

/// The built-in expression engine.
///
/// # Examples
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::expression::{Evaluated, ExpressionEngine, JsonataEngine};
/// use serde_json::json;
///
/// let input = Value::from(json!({"items": [{"price": 5}, {"price": 20}]}));
/// let result = JsonataEngine.evaluate("$sum(items.price)", &input).unwrap();
/// assert_eq!(result, Evaluated::Value(Value::Number(25.0)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonataEngine;

impl ExpressionEngine for JsonataEngine {
    fn evaluate(&self, expr: &str, input: &Value) -> Result<Evaluated, AdapterError> {
        debug!(expression = expr, "evaluating expression");
        let node = parser::parse(expr)?;
        eval::evaluate(&node, input)
    }
}
