use regex::Regex;

use super::parser::{BinOp, Node, Step};
use super::{Evaluated, Sequence};
use crate::adapters::AdapterError;
use crate::functions::{ArithOp, decimal_op, unique};
use crate::output::to_json;
use crate::value::{Map, Value, compare_values, format_number};

/// Result of evaluating a node; `None` is "no value" (a path that matched
/// nothing, an unbound variable).
type Outcome = Result<Option<Value>, AdapterError>;

/// Evaluate a parsed expression against `input`.
///
/// A path that yields more than one item (or was written with `[]`) comes
/// back as a [`Sequence`].
pub fn evaluate(node: &Node, input: &Value) -> Result<Evaluated, AdapterError> {
    let frame = Frame { root: input };
    match node {
        Node::Path(steps) => {
            let sequence = frame.eval_path(steps, input)?;
            if sequence.items.len() > 1 || sequence.keep_singleton {
                return Ok(Evaluated::Sequence(sequence));
            }
            Ok(Evaluated::Value(
                sequence.items.into_iter().next().unwrap_or_default(),
            ))
        }
        _ => Ok(Evaluated::Value(frame.eval(node, input)?.unwrap_or_default())),
    }
}

struct Frame<'a> {
    root: &'a Value,
}

impl Frame<'_> {
    fn eval(&self, node: &Node, input: &Value) -> Outcome {
        match node {
            Node::Number(n) => Ok(Some(Value::Number(*n))),
            Node::String(s) => Ok(Some(Value::String(s.clone()))),
            Node::Boolean(b) => Ok(Some(Value::Boolean(*b))),
            Node::Null => Ok(Some(Value::Null)),
            Node::Regex(_) => Err(AdapterError::expression(
                "a regex can only be used as a function argument",
                0,
            )),
            Node::Name(name) => Ok(collapse(lookup(input, name))),
            Node::Wildcard => Ok(collapse(wildcard(input))),
            Node::Context => Ok(Some(input.clone())),
            Node::Root => Ok(Some(self.root.clone())),
            Node::Path(steps) => {
                let sequence = self.eval_path(steps, input)?;
                if sequence.keep_singleton {
                    return Ok(Some(Value::Array(sequence.items)));
                }
                Ok(collapse(sequence.items))
            }
            Node::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    match (item, self.eval(item, input)?) {
                        (Node::Path(_), Some(Value::Array(inner))) => out.extend(inner),
                        (_, Some(value)) => out.push(value),
                        (_, None) => {}
                    }
                }
                Ok(Some(Value::Array(out)))
            }
            Node::Object(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    let key = match self.eval(key, input)? {
                        Some(Value::String(key)) => key,
                        other => {
                            return Err(AdapterError::expression(
                                format!(
                                    "object key must be a string, found {}",
                                    other.as_ref().map_or("nothing", Value::type_name)
                                ),
                                0,
                            ));
                        }
                    };
                    if let Some(value) = self.eval(value, input)? {
                        map.insert(key, value);
                    }
                }
                Ok(Some(Value::Object(map)))
            }
            Node::Negate { operand, position } => match self.eval(operand, input)? {
                None => Ok(None),
                Some(Value::Number(n)) => Ok(Some(Value::Number(-n))),
                Some(other) => Err(AdapterError::expression(
                    format!("cannot negate {}", other.type_name()),
                    *position,
                )),
            },
            Node::Binary {
                op,
                left,
                right,
                position,
            } => self.eval_binary(*op, left, right, input, *position),
            Node::Condition {
                condition,
                then,
                otherwise,
            } => {
                if truthy(self.eval(condition, input)?.as_ref()) {
                    self.eval(then, input)
                } else {
                    match otherwise {
                        Some(otherwise) => self.eval(otherwise, input),
                        None => Ok(None),
                    }
                }
            }
            Node::Call {
                name,
                args,
                position,
            } => self.eval_call(name, args, input, *position),
        }
    }

    fn eval_path(&self, steps: &[Step], input: &Value) -> Result<Sequence, AdapterError> {
        let mut current = vec![input.clone()];
        let mut keep_singleton = false;

        for step in steps {
            let mut next = Vec::new();
            for item in &current {
                let mut produced = self.step_items(&step.node, item)?;
                for predicate in &step.predicates {
                    produced = self.filter(produced, predicate)?;
                }
                next.extend(produced);
            }
            keep_singleton |= step.keep_array;
            current = next;
        }

        Ok(Sequence {
            items: current,
            keep_singleton,
        })
    }

    /// Items one path step produces from one context item. Arrays are
    /// flattened one level into the sequence.
    fn step_items(&self, node: &Node, item: &Value) -> Result<Vec<Value>, AdapterError> {
        Ok(match node {
            Node::Name(name) => lookup(item, name),
            Node::Wildcard => wildcard(item),
            other => match self.eval(other, item)? {
                None => Vec::new(),
                Some(Value::Array(items)) => items,
                Some(value) => vec![value],
            },
        })
    }

    /// Apply a `[...]` predicate: a number selects by index (negative counts
    /// from the end), anything else filters by truthiness.
    fn filter(&self, items: Vec<Value>, predicate: &Node) -> Result<Vec<Value>, AdapterError> {
        let len = items.len();
        let mut out = Vec::new();
        for (idx, item) in items.into_iter().enumerate() {
            let keep = match self.eval(predicate, &item)? {
                Some(Value::Number(n)) => index_matches(n, idx, len),
                Some(Value::Array(values))
                    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Number(_))) =>
                {
                    values
                        .iter()
                        .filter_map(Value::as_f64)
                        .any(|n| index_matches(n, idx, len))
                }
                other => truthy(other.as_ref()),
            };
            if keep {
                out.push(item);
            }
        }
        Ok(out)
    }

    fn eval_binary(&self, op: BinOp, left: &Node, right: &Node, input: &Value, position: usize) -> Outcome {
        match op {
            BinOp::And => {
                let result = truthy(self.eval(left, input)?.as_ref())
                    && truthy(self.eval(right, input)?.as_ref());
                Ok(Some(Value::Boolean(result)))
            }
            BinOp::Or => {
                let result = truthy(self.eval(left, input)?.as_ref())
                    || truthy(self.eval(right, input)?.as_ref());
                Ok(Some(Value::Boolean(result)))
            }
            _ => {
                let left = self.eval(left, input)?;
                let right = self.eval(right, input)?;
                apply_binop(op, left, right, position)
            }
        }
    }

    fn eval_call(&self, name: &str, nodes: &[Node], input: &Value, position: usize) -> Outcome {
        let mut values = Vec::with_capacity(nodes.len());
        for node in nodes {
            values.push(match node {
                Node::Regex(re) => Arg::Regex(re.clone()),
                other => Arg::Value(self.eval(other, input)?),
            });
        }
        let args = Args {
            name,
            values,
            context: input,
            position,
        };
        call_function(&args)
    }
}

fn index_matches(n: f64, idx: usize, len: usize) -> bool {
    let n = n.floor();
    if n < 0.0 {
        len as f64 + n == idx as f64
    } else {
        n == idx as f64
    }
}

/// Field lookup that maps over arrays and flattens array results.
fn lookup(value: &Value, name: &str) -> Vec<Value> {
    match value {
        Value::Object(map) => match map.get(name) {
            Some(Value::Array(items)) => items.clone(),
            Some(found) => vec![found.clone()],
            None => Vec::new(),
        },
        Value::Array(items) => items.iter().flat_map(|item| lookup(item, name)).collect(),
        _ => Vec::new(),
    }
}

fn wildcard(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            })
            .collect(),
        Value::Array(items) => items.iter().flat_map(wildcard).collect(),
        _ => Vec::new(),
    }
}

fn collapse(mut items: Vec<Value>) -> Option<Value> {
    match items.len() {
        0 => None,
        1 => items.pop(),
        _ => Some(Value::Array(items)),
    }
}

/// Boolean view of a value: empty strings, zero, null, empty containers and
/// "no value" are false; an array is true if any member is.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Boolean(b)) => *b,
        Some(Value::Number(n)) => *n != 0.0,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => items.iter().any(|item| truthy(Some(item))),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// String form used by `&` and `$string`.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(*n),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => to_json(value),
    }
}

fn apply_binop(op: BinOp, left: Option<Value>, right: Option<Value>, position: usize) -> Outcome {
    match op {
        BinOp::Concat => {
            let text = |v: Option<Value>| v.as_ref().map(stringify).unwrap_or_default();
            Ok(Some(Value::String(text(left) + &text(right))))
        }
        BinOp::Equal => Ok(Some(Value::Boolean(matches!((left, right), (Some(a), Some(b)) if a == b)))),
        BinOp::NotEqual => Ok(Some(Value::Boolean(matches!((left, right), (Some(a), Some(b)) if a != b)))),
        BinOp::In => Ok(Some(Value::Boolean(match (left, right) {
            (Some(needle), Some(Value::Array(haystack))) => haystack.contains(&needle),
            (Some(needle), Some(single)) => needle == single,
            _ => false,
        }))),
        BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
            let (Some(left), Some(right)) = (left, right) else {
                return Ok(None);
            };
            match (&left, &right) {
                (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
                    let ord = compare_values(&left, &right);
                    Ok(Some(Value::Boolean(match op {
                        BinOp::LessThan => ord.is_lt(),
                        BinOp::LessEqual => ord.is_le(),
                        BinOp::GreaterThan => ord.is_gt(),
                        _ => ord.is_ge(),
                    })))
                }
                _ => Err(AdapterError::expression(
                    format!("cannot compare {} with {}", left.type_name(), right.type_name()),
                    position,
                )),
            }
        }
        _ => {
            let (Some(left), Some(right)) = (left, right) else {
                return Ok(None);
            };
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(AdapterError::expression(
                    format!(
                        "arithmetic needs numbers, found {} and {}",
                        left.type_name(),
                        right.type_name()
                    ),
                    position,
                ));
            };
            let arith = match op {
                BinOp::Add => ArithOp::Add,
                BinOp::Subtract => ArithOp::Sub,
                BinOp::Multiply => ArithOp::Mul,
                BinOp::Divide => ArithOp::Div,
                _ => ArithOp::Rem,
            };
            let result = decimal_op(arith, *a, *b);
            if !result.is_finite() {
                return Err(AdapterError::expression("number out of range", position));
            }
            Ok(Some(Value::Number(result)))
        }
    }
}

enum Arg {
    Value(Option<Value>),
    Regex(Regex),
}

enum Pattern {
    Text(String),
    Regex(Regex),
}

/// Evaluated arguments of a function call.
struct Args<'a> {
    name: &'a str,
    values: Vec<Arg>,
    /// Stands in for the first argument when a call has none
    context: &'a Value,
    position: usize,
}

impl Args<'_> {
    fn error<T>(&self, message: String) -> Result<T, AdapterError> {
        Err(AdapterError::expression(
            format!("${}: {}", self.name, message),
            self.position,
        ))
    }

    fn at_most(&self, max: usize) -> Result<(), AdapterError> {
        if self.values.len() > max {
            return self.error(format!("takes at most {} argument(s), found {}", max, self.values.len()));
        }
        Ok(())
    }

    fn value(&self, idx: usize) -> Result<Option<Value>, AdapterError> {
        if idx == 0 && self.values.is_empty() {
            return Ok(Some(self.context.clone()));
        }
        match self.values.get(idx) {
            None => Ok(None),
            Some(Arg::Value(value)) => Ok(value.clone()),
            Some(Arg::Regex(_)) => self.error(format!("argument {} cannot be a regex", idx + 1)),
        }
    }

    fn string(&self, idx: usize) -> Result<Option<String>, AdapterError> {
        match self.value(idx)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => self.error(format!(
                "argument {} must be a string, found {}",
                idx + 1,
                other.type_name()
            )),
        }
    }

    fn number(&self, idx: usize) -> Result<Option<f64>, AdapterError> {
        match self.value(idx)? {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n)),
            Some(other) => self.error(format!(
                "argument {} must be a number, found {}",
                idx + 1,
                other.type_name()
            )),
        }
    }

    fn required_number(&self, idx: usize) -> Result<f64, AdapterError> {
        match self.number(idx)? {
            Some(n) => Ok(n),
            None => self.error(format!("argument {} is required", idx + 1)),
        }
    }

    fn required_string(&self, idx: usize) -> Result<String, AdapterError> {
        match self.string(idx)? {
            Some(s) => Ok(s),
            None => self.error(format!("argument {} is required", idx + 1)),
        }
    }

    fn pattern(&self, idx: usize) -> Result<Pattern, AdapterError> {
        match self.values.get(idx) {
            Some(Arg::Regex(re)) => Ok(Pattern::Regex(re.clone())),
            Some(Arg::Value(Some(Value::String(s)))) => Ok(Pattern::Text(s.clone())),
            _ => self.error(format!("argument {} must be a string or a regex", idx + 1)),
        }
    }

    /// The argument as a list: nothing is empty, a scalar is one item.
    fn array(&self, idx: usize) -> Result<Vec<Value>, AdapterError> {
        Ok(match self.value(idx)? {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(single) => vec![single],
        })
    }

    fn numbers(&self, idx: usize) -> Result<Vec<f64>, AdapterError> {
        let mut out = Vec::new();
        for item in self.array(idx)? {
            match item {
                Value::Number(n) => out.push(n),
                other => {
                    return self.error(format!("expects numbers, found {}", other.type_name()));
                }
            }
        }
        Ok(out)
    }
}

fn sum(numbers: &[f64]) -> f64 {
    numbers
        .iter()
        .fold(0.0, |acc, n| decimal_op(ArithOp::Add, acc, *n))
}

fn call_function(args: &Args<'_>) -> Outcome {
    match args.name {
        "count" => {
            args.at_most(1)?;
            Ok(Some(Value::from(args.array(0)?.len())))
        }
        "sum" => {
            args.at_most(1)?;
            Ok(Some(Value::Number(sum(&args.numbers(0)?))))
        }
        "max" | "min" => {
            args.at_most(1)?;
            let numbers = args.numbers(0)?;
            let pick: fn(f64, f64) -> f64 = if args.name == "max" { f64::max } else { f64::min };
            Ok(numbers.into_iter().reduce(pick).map(Value::Number))
        }
        "average" => {
            args.at_most(1)?;
            let numbers = args.numbers(0)?;
            if numbers.is_empty() {
                return Ok(None);
            }
            let mean = decimal_op(ArithOp::Div, sum(&numbers), numbers.len() as f64);
            Ok(Some(Value::Number(mean)))
        }
        "string" => {
            args.at_most(1)?;
            Ok(args.value(0)?.map(|v| Value::String(stringify(&v))))
        }
        "number" => {
            args.at_most(1)?;
            match args.value(0)? {
                None => Ok(None),
                Some(Value::Number(n)) => Ok(Some(Value::Number(n))),
                Some(Value::Boolean(b)) => Ok(Some(Value::Number(if b { 1.0 } else { 0.0 }))),
                Some(Value::String(s)) => match s.trim().parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Some(Value::Number(n))),
                    _ => args.error(format!("cannot convert '{}' to a number", s)),
                },
                Some(other) => args.error(format!("cannot convert {} to a number", other.type_name())),
            }
        }
        "length" => {
            args.at_most(1)?;
            Ok(args.string(0)?.map(|s| Value::from(s.chars().count())))
        }
        "uppercase" => {
            args.at_most(1)?;
            Ok(args.string(0)?.map(|s| Value::String(s.to_uppercase())))
        }
        "lowercase" => {
            args.at_most(1)?;
            Ok(args.string(0)?.map(|s| Value::String(s.to_lowercase())))
        }
        "trim" => {
            args.at_most(1)?;
            Ok(args
                .string(0)?
                .map(|s| Value::String(s.split_whitespace().collect::<Vec<_>>().join(" "))))
        }
        "substring" => {
            args.at_most(3)?;
            let Some(s) = args.string(0)? else {
                return Ok(None);
            };
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let start = args.required_number(1)?.floor() as i64;
            let start = if start < 0 { (len + start).max(0) } else { start.min(len) };
            let start = start as usize;
            let taken: String = match args.number(2)? {
                Some(count) if count <= 0.0 => String::new(),
                Some(count) => chars.iter().skip(start).take(count.floor() as usize).collect(),
                None => chars.iter().skip(start).collect(),
            };
            Ok(Some(Value::String(taken)))
        }
        "contains" => {
            args.at_most(2)?;
            let Some(s) = args.string(0)? else {
                return Ok(None);
            };
            let found = match args.pattern(1)? {
                Pattern::Text(t) => s.contains(&t),
                Pattern::Regex(re) => re.is_match(&s),
            };
            Ok(Some(Value::Boolean(found)))
        }
        "split" => {
            args.at_most(3)?;
            let Some(s) = args.string(0)? else {
                return Ok(None);
            };
            let parts: Vec<String> = match args.pattern(1)? {
                Pattern::Text(t) if t.is_empty() => s.chars().map(String::from).collect(),
                Pattern::Text(t) => s.split(t.as_str()).map(str::to_string).collect(),
                Pattern::Regex(re) => re.split(&s).map(str::to_string).collect(),
            };
            let limit = match args.number(2)? {
                Some(n) if n < 0.0 => return args.error("limit cannot be negative".to_string()),
                Some(n) => n as usize,
                None => usize::MAX,
            };
            Ok(Some(Value::Array(
                parts.into_iter().take(limit).map(Value::String).collect(),
            )))
        }
        "join" => {
            args.at_most(2)?;
            let separator = args.string(1)?.unwrap_or_default();
            let mut parts = Vec::new();
            for item in args.array(0)? {
                match item {
                    Value::String(s) => parts.push(s),
                    other => {
                        return args.error(format!("expects strings, found {}", other.type_name()));
                    }
                }
            }
            Ok(Some(Value::String(parts.join(&separator))))
        }
        "replace" => {
            args.at_most(4)?;
            let Some(s) = args.string(0)? else {
                return Ok(None);
            };
            let replacement = args.required_string(2)?;
            let limit = match args.number(3)? {
                Some(n) if n < 0.0 => return args.error("limit cannot be negative".to_string()),
                Some(n) => Some(n as usize),
                None => None,
            };
            let replaced = match args.pattern(1)? {
                Pattern::Text(t) if t.is_empty() => {
                    return args.error("pattern cannot be empty".to_string());
                }
                Pattern::Text(t) => match limit {
                    Some(n) => s.replacen(t.as_str(), &replacement, n),
                    None => s.replace(t.as_str(), &replacement),
                },
                Pattern::Regex(re) => match limit {
                    Some(0) => s,
                    Some(n) => re.replacen(&s, n, replacement.as_str()).into_owned(),
                    None => re.replace_all(&s, replacement.as_str()).into_owned(),
                },
            };
            Ok(Some(Value::String(replaced)))
        }
        "keys" => {
            args.at_most(1)?;
            let mut keys: Vec<Value> = Vec::new();
            let objects = match args.value(0)? {
                Some(Value::Array(items)) => items,
                Some(single) => vec![single],
                None => Vec::new(),
            };
            for object in &objects {
                if let Value::Object(map) = object {
                    for key in map.keys() {
                        let key = Value::String(key.clone());
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }
            }
            Ok((!keys.is_empty()).then_some(Value::Array(keys)))
        }
        "exists" => {
            args.at_most(1)?;
            Ok(Some(Value::Boolean(args.value(0)?.is_some())))
        }
        "not" => {
            args.at_most(1)?;
            Ok(args.value(0)?.map(|v| Value::Boolean(!truthy(Some(&v)))))
        }
        "boolean" => {
            args.at_most(1)?;
            Ok(args.value(0)?.map(|v| Value::Boolean(truthy(Some(&v)))))
        }
        "distinct" => {
            args.at_most(1)?;
            Ok(args.value(0)?.map(|v| match v {
                Value::Array(items) => Value::Array(unique(&items)),
                other => other,
            }))
        }
        "reverse" => {
            args.at_most(1)?;
            Ok(args.value(0)?.map(|v| match v {
                Value::Array(mut items) => {
                    items.reverse();
                    Value::Array(items)
                }
                other => other,
            }))
        }
        other => Err(AdapterError::expression(
            format!("unknown function ${}", other),
            args.position,
        )),
    }
}
