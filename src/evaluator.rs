use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    adapters::{self, AdapterError},
    ast::{Direction, OrderField, ProjectItem, Stage},
    expression::{Evaluated, ExpressionEngine, JsonataEngine},
    functions::unique,
    summarize::summarize,
    value::{Map, Value, compare_values},
};

/// State threaded through the pipeline.
///
/// `value` is what the stages transform; `context` travels alongside it
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    pub value: Value,
    pub context: Map,
}

impl Accumulator {
    pub fn new(value: Value) -> Self {
        Accumulator {
            value,
            context: Map::new(),
        }
    }
}

/// Errors that abort a pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A format adapter or the expression engine rejected its input
    #[error("{stage} failed: {source}")]
    Adapter {
        stage: &'static str,
        source: AdapterError,
    },
}

/// The pipeline evaluator.
///
/// Folds stages left to right over an [`Accumulator`]. Every stage decides
/// what to do from the shape of the current value; a stage that does not
/// apply to that shape passes the value through.
#[derive(Clone)]
pub struct Evaluator {
    engine: Arc<dyn ExpressionEngine + Send + Sync>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::with_engine(Arc::new(JsonataEngine))
    }
}

impl Evaluator {
    /// Creates an evaluator backed by the built-in expression engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator that runs `jsonata` stages through `engine`.
    pub fn with_engine(engine: Arc<dyn ExpressionEngine + Send + Sync>) -> Self {
        Evaluator { engine }
    }

    /// Runs `stages` over `input` and returns the final value.
    ///
    /// # Examples
    ///
    /// ```
    /// use uql_lang::{Evaluator, Value};
    /// use uql_lang::parser::parse_query;
    /// use serde_json::json;
    ///
    /// let stages = parse_query("order by \"n\" desc | limit 2").unwrap();
    /// let input = Value::from(json!([{"n": 1}, {"n": 3}, {"n": 2}]));
    ///
    /// let result = Evaluator::new().eval_stages(&stages, input).unwrap();
    /// assert_eq!(result, Value::from(json!([{"n": 3}, {"n": 2}])));
    /// ```
    pub fn eval_stages(&self, stages: &[Stage], input: Value) -> Result<Value, EvalError> {
        let acc = stages
            .iter()
            .try_fold(Accumulator::new(input), |acc, stage| self.eval_stage(stage, acc))?;
        Ok(acc.value)
    }

    /// Runs a single stage.
    pub fn eval_stage(&self, stage: &Stage, acc: Accumulator) -> Result<Accumulator, EvalError> {
        let Accumulator { value, context } = acc;
        debug!(stage = stage.name(), shape = value.type_name(), "evaluating stage");

        let value = match stage {
            Stage::Comment(_) => value,
            Stage::Hello => Value::from("hello"),
            Stage::Ping(literal) | Stage::Echo(literal) => literal.clone(),
            Stage::Scope(path) => value.get(path),
            Stage::Expression(text) => self.eval_expression(text, &value)?,
            Stage::Distinct(field) => distinct(stage, value, field.as_deref()),
            Stage::MvExpand { field, alias } => mv_expand(stage, value, field, alias.as_deref()),
            Stage::Count => match value {
                Value::Array(items) => Value::from(items.len()),
                Value::String(s) => Value::from(s.chars().count()),
                other => skipped(stage, other),
            },
            Stage::Limit(n) => match value {
                Value::Array(mut items) => {
                    items.truncate(*n);
                    Value::Array(items)
                }
                Value::String(s) => Value::String(s.chars().take(*n).collect()),
                other => skipped(stage, other),
            },
            Stage::Command(operator) => operator.apply_to(&value),
            Stage::OrderBy(fields) => match value {
                Value::Array(mut items) => {
                    items.sort_by(|a, b| compare_rows(a, b, fields));
                    Value::Array(items)
                }
                other => skipped(stage, other),
            },
            Stage::Extend(items) => extend(stage, value, items),
            Stage::Project(items) => project(stage, value, items),
            Stage::ProjectAway(fields) => match value {
                Value::Array(rows) => Value::Array(
                    rows.into_iter()
                        .map(|mut row| {
                            for field in fields {
                                row.remove(field);
                            }
                            row
                        })
                        .collect(),
                ),
                other => skipped(stage, other),
            },
            Stage::Summarize { by, metrics } => match value {
                Value::Array(rows) => summarize(&rows, by, metrics),
                other => skipped(stage, other),
            },
            Stage::ParseJson => parse_text(stage, value, adapters::json::parse)?,
            Stage::ParseCsv(options) => {
                parse_text(stage, value, |text| adapters::csv::parse(text, options))?
            }
            Stage::ParseXml(options) => {
                parse_text(stage, value, |text| adapters::xml::parse(text, options))?
            }
            Stage::ParseYaml => parse_text(stage, value, adapters::yaml::parse)?,
        };

        Ok(Accumulator { value, context })
    }

    fn eval_expression(&self, text: &str, value: &Value) -> Result<Value, EvalError> {
        let result = self
            .engine
            .evaluate(text, value)
            .map_err(|source| EvalError::Adapter {
                stage: "jsonata",
                source,
            })?;
        // Sequences carry engine bookkeeping; only their items go on.
        Ok(match result {
            Evaluated::Value(value) => value,
            Evaluated::Sequence(sequence) => Value::Array(sequence.items),
        })
    }
}

fn skipped(stage: &Stage, value: Value) -> Value {
    trace!(
        stage = stage.name(),
        shape = value.type_name(),
        "stage does not apply to value, passing through"
    );
    value
}

fn parse_text<F>(stage: &Stage, value: Value, parse: F) -> Result<Value, EvalError>
where
    F: FnOnce(&str) -> Result<Value, AdapterError>,
{
    match value {
        Value::String(text) => parse(&text).map_err(|source| EvalError::Adapter {
            stage: stage.name(),
            source,
        }),
        other => Ok(skipped(stage, other)),
    }
}

fn distinct(stage: &Stage, value: Value, field: Option<&str>) -> Value {
    match (value, field) {
        (Value::Array(items), None) => Value::Array(unique(&items)),
        (Value::Array(items), Some(field)) => {
            let projected: Vec<Value> = items.iter().map(|item| item.get(field)).collect();
            Value::Array(unique(&projected))
        }
        (other, Some(field)) => match other.get(field) {
            Value::Array(inner) => Value::Array(unique(&inner)),
            single => Value::Array(vec![single]),
        },
        (other, None) => skipped(stage, other),
    }
}

fn mv_expand(stage: &Stage, value: Value, field: &str, alias: Option<&str>) -> Value {
    let rows = match value {
        Value::Array(rows) => rows,
        other => return skipped(stage, other),
    };

    let mut out = Vec::new();
    for row in rows {
        let Value::Array(expansion) = row.get(field) else {
            continue;
        };
        for item in expansion {
            let mut copy = row.clone();
            match alias {
                Some(alias) => {
                    copy.remove(field);
                    copy.set_in_place(alias, item);
                }
                None => copy.set_in_place(field, item),
            }
            out.push(copy);
        }
    }
    Value::Array(out)
}

/// Row ordering for `order by`: missing or null keys go last when ascending.
fn compare_rows(a: &Value, b: &Value, fields: &[OrderField]) -> Ordering {
    for OrderField { field, direction } in fields {
        let ord = compare_values(&a.get(field), &b.get(field));
        let ord = match direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Value of one `project`/`extend` item for `row`.
fn item_value(row: &Value, item: &ProjectItem, context: Option<&Value>) -> Value {
    match item {
        ProjectItem::Ref { field, .. } => row.get(field),
        ProjectItem::Function { operator, args, .. } => {
            let args: Vec<Value> = args.iter().map(|arg| arg.resolve(row)).collect();
            operator.apply(&args, context)
        }
    }
}

fn extend(stage: &Stage, value: Value, items: &[ProjectItem]) -> Value {
    let rows = match value {
        Value::Array(rows) => rows,
        other => return skipped(stage, other),
    };
    let context = Value::Array(rows.clone());

    let rows = rows
        .into_iter()
        .map(|mut row| {
            for item in items {
                let computed = item_value(&row, item, Some(&context));
                row.set_in_place(item.target(), computed);
            }
            row
        })
        .collect();
    Value::Array(rows)
}

fn project_row(row: &Value, items: &[ProjectItem], context: Option<&Value>) -> Value {
    let mut out = Value::Object(Map::new());
    for item in items {
        out.set_in_place(item.target(), item_value(row, item, context));
    }
    out
}

fn project(stage: &Stage, value: Value, items: &[ProjectItem]) -> Value {
    match value {
        Value::Array(rows) => {
            let context = Value::Array(rows.clone());
            Value::Array(
                rows.iter()
                    .map(|row| project_row(row, items, Some(&context)))
                    .collect(),
            )
        }
        Value::Object(_) => match items {
            [single] => item_value(&value, single, None),
            _ => project_row(&value, items, None),
        },
        other => skipped(stage, other),
    }
}
