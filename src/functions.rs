//! The function registry shared by `extend`, `project`, `summarize` and
//! top-level commands.
//!
//! Every operator declares the shape of input it works on. Calling an
//! operator with a value of the wrong shape returns that value unchanged, so a
//! pipeline over heterogeneous data keeps flowing. Unknown operator names are
//! rejected when the name is resolved, see [`Operator::from_str`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;

use crate::value::{Value, ValueIndex, compare_values};

/// A registry operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Count,
    Sum,
    Diff,
    Mul,
    Min,
    Max,
    Mean,
    First,
    Last,
    Latest,
    Strcat,
    Dcount,
    Distinct,
    Random,
    ToUpper,
    ToLower,
    Strlen,
    Trim,
    TrimStart,
    TrimEnd,
}

/// How many arguments an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Zero,
    Unary,
    Binary,
    Variadic,
}

/// The input shape an operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Ignores its input
    Nothing,
    /// An array built from the arguments or the aggregate context
    Array,
    /// The first argument, which must be a string
    String,
}

/// Name that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

const ALL: [Operator; 20] = [
    Operator::Count,
    Operator::Sum,
    Operator::Diff,
    Operator::Mul,
    Operator::Min,
    Operator::Max,
    Operator::Mean,
    Operator::First,
    Operator::Last,
    Operator::Latest,
    Operator::Strcat,
    Operator::Dcount,
    Operator::Distinct,
    Operator::Random,
    Operator::ToUpper,
    Operator::ToLower,
    Operator::Strlen,
    Operator::Trim,
    Operator::TrimStart,
    Operator::TrimEnd,
];

impl Operator {
    /// Every registered operator, in listing order.
    pub fn all() -> &'static [Operator] {
        &ALL
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Count => "count",
            Operator::Sum => "sum",
            Operator::Diff => "diff",
            Operator::Mul => "mul",
            Operator::Min => "min",
            Operator::Max => "max",
            Operator::Mean => "mean",
            Operator::First => "first",
            Operator::Last => "last",
            Operator::Latest => "latest",
            Operator::Strcat => "strcat",
            Operator::Dcount => "dcount",
            Operator::Distinct => "distinct",
            Operator::Random => "random",
            Operator::ToUpper => "toupper",
            Operator::ToLower => "tolower",
            Operator::Strlen => "strlen",
            Operator::Trim => "trim",
            Operator::TrimStart => "trim_start",
            Operator::TrimEnd => "trim_end",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::Random => Arity::Zero,
            Operator::Diff | Operator::Mul => Arity::Binary,
            Operator::ToUpper
            | Operator::ToLower
            | Operator::Strlen
            | Operator::Trim
            | Operator::TrimStart
            | Operator::TrimEnd => Arity::Unary,
            _ => Arity::Variadic,
        }
    }

    pub fn shape(self) -> Shape {
        match self.arity() {
            Arity::Zero => Shape::Nothing,
            Arity::Unary => Shape::String,
            Arity::Binary | Arity::Variadic => Shape::Array,
        }
    }

    /// One-line description for `uql functions`.
    pub fn description(self) -> &'static str {
        match self {
            Operator::Count => "number of elements of an array, or characters of a string",
            Operator::Sum => "sum of numbers (0 when empty)",
            Operator::Diff => "a - b for exactly two numbers",
            Operator::Mul => "a * b for exactly two numbers",
            Operator::Min => "smallest number (null when empty)",
            Operator::Max => "largest number (null when empty)",
            Operator::Mean => "arithmetic mean (null when empty)",
            Operator::First => "first element",
            Operator::Last => "last element",
            Operator::Latest => "greatest element when all are numbers or all strings, else the last",
            Operator::Strcat => "concatenation without separator",
            Operator::Dcount => "number of distinct elements",
            Operator::Distinct => "distinct elements in order of first occurrence",
            Operator::Random => "random number in [0, 1)",
            Operator::ToUpper => "uppercase string",
            Operator::ToLower => "lowercase string",
            Operator::Strlen => "number of characters",
            Operator::Trim => "string without surrounding whitespace",
            Operator::TrimStart => "string without leading whitespace",
            Operator::TrimEnd => "string without trailing whitespace",
        }
    }

    /// Apply the operator to call arguments.
    ///
    /// Array-shaped operators use a single array argument as their input,
    /// otherwise the argument list itself; with no arguments they fall back
    /// to `context` (the whole array or group being processed).
    ///
    /// # Examples
    ///
    /// ```
    /// use uql_lang::Value;
    /// use uql_lang::functions::Operator;
    ///
    /// let args = [Value::Number(2.0), Value::Number(3.0)];
    /// assert_eq!(Operator::Sum.apply(&args, None), Value::Number(5.0));
    /// assert_eq!(Operator::Diff.apply(&args, None), Value::Number(-1.0));
    /// ```
    pub fn apply(self, args: &[Value], context: Option<&Value>) -> Value {
        let input = match (self.shape(), args) {
            (Shape::Nothing, _) => Value::Null,
            (Shape::String, args) => args.first().cloned().unwrap_or(Value::Null),
            (Shape::Array, []) => context.cloned().unwrap_or(Value::Array(Vec::new())),
            (Shape::Array, [single @ Value::Array(_)]) => single.clone(),
            (Shape::Array, [single @ Value::String(_)]) if self == Operator::Count => single.clone(),
            (Shape::Array, many) => Value::Array(many.to_vec()),
        };
        self.apply_to(&input)
    }

    /// Apply the operator to a whole value, as a top-level command does.
    ///
    /// A value of the wrong shape comes back unchanged.
    pub fn apply_to(self, input: &Value) -> Value {
        self.eval(input).unwrap_or_else(|| input.clone())
    }

    fn eval(self, input: &Value) -> Option<Value> {
        match self {
            Operator::Count => match input {
                Value::Array(arr) => Some(Value::from(arr.len())),
                Value::String(s) => Some(Value::from(s.chars().count())),
                _ => None,
            },
            Operator::Sum => {
                let numbers = numbers(input)?;
                Some(Value::Number(
                    numbers.into_iter().fold(0.0, |acc, n| decimal_op(ArithOp::Add, acc, n)),
                ))
            }
            Operator::Mean => {
                let numbers = numbers(input)?;
                if numbers.is_empty() {
                    return Some(Value::Null);
                }
                let count = numbers.len() as f64;
                let total = numbers.into_iter().fold(0.0, |acc, n| decimal_op(ArithOp::Add, acc, n));
                Some(Value::Number(decimal_op(ArithOp::Div, total, count)))
            }
            Operator::Min => Some(numbers(input)?.into_iter().reduce(f64::min).map_or(Value::Null, Value::Number)),
            Operator::Max => Some(numbers(input)?.into_iter().reduce(f64::max).map_or(Value::Null, Value::Number)),
            Operator::Diff | Operator::Mul => match input {
                Value::Array(arr) => match arr.as_slice() {
                    [Value::Number(a), Value::Number(b)] => {
                        let op = if self == Operator::Diff { ArithOp::Sub } else { ArithOp::Mul };
                        Some(Value::Number(decimal_op(op, *a, *b)))
                    }
                    _ => None,
                },
                _ => None,
            },
            Operator::First => input.as_array()?.first().cloned(),
            Operator::Last => input.as_array()?.last().cloned(),
            Operator::Latest => latest(input.as_array()?),
            Operator::Strcat => {
                let mut out = String::new();
                for item in input.as_array()? {
                    match item {
                        Value::String(_) | Value::Number(_) | Value::Boolean(_) => {
                            out.push_str(&item.as_string())
                        }
                        _ => return None,
                    }
                }
                Some(Value::String(out))
            }
            Operator::Dcount => Some(Value::from(unique(input.as_array()?).len())),
            Operator::Distinct => Some(Value::Array(unique(input.as_array()?))),
            Operator::Random => Some(Value::Number(fastrand::f64())),
            Operator::ToUpper => Some(Value::String(input.as_str()?.to_uppercase())),
            Operator::ToLower => Some(Value::String(input.as_str()?.to_lowercase())),
            Operator::Strlen => Some(Value::from(input.as_str()?.chars().count())),
            Operator::Trim => Some(Value::from(input.as_str()?.trim())),
            Operator::TrimStart => Some(Value::from(input.as_str()?.trim_start())),
            Operator::TrimEnd => Some(Value::from(input.as_str()?.trim_end())),
        }
    }
}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|op| op.name() == name)
            .ok_or_else(|| UnknownOperator(name.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numbers of an array, skipping nulls. `None` if anything else shows up.
fn numbers(input: &Value) -> Option<Vec<f64>> {
    let mut out = Vec::new();
    for item in input.as_array()? {
        match item {
            Value::Number(n) => out.push(*n),
            Value::Null => {}
            _ => return None,
        }
    }
    Some(out)
}

/// Unique elements by deep equality, first occurrence wins.
pub fn unique(items: &[Value]) -> Vec<Value> {
    let mut seen = ValueIndex::default();
    items
        .iter()
        .filter(|item| seen.insert(item).1)
        .cloned()
        .collect()
}

/// The element judged most recent.
///
/// When every element is a number, or every element is a string (ISO-8601
/// timestamps order correctly as strings), this is the last element of a
/// stable ascending sort. Otherwise it is simply the last element.
fn latest(items: &[Value]) -> Option<Value> {
    let orderable = items.iter().all(|v| matches!(v, Value::Number(_)))
        || items.iter().all(|v| matches!(v, Value::String(_)));
    if !orderable {
        return items.last().cloned();
    }
    let mut sorted = items.to_vec();
    sorted.sort_by(compare_values);
    sorted.pop()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Arithmetic through `Decimal` when both sides are representable, so
/// `0.1 + 0.2` is `0.3`. Falls back to plain `f64` otherwise.
pub(crate) fn decimal_op(op: ArithOp, a: f64, b: f64) -> f64 {
    if let Some(ad) = Decimal::from_f64(a)
        && let Some(bd) = Decimal::from_f64(b)
    {
        let rd = match op {
            ArithOp::Add => ad.checked_add(bd),
            ArithOp::Sub => ad.checked_sub(bd),
            ArithOp::Mul => ad.checked_mul(bd),
            ArithOp::Div => ad.checked_div(bd),
            ArithOp::Rem => ad.checked_rem(bd),
        };
        if let Some(r) = rd.and_then(|rd| rd.to_f64()) {
            return r;
        }
    }
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    }
}
