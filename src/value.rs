use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

use crate::path;

/// Object storage used by [`Value::Object`]. Keys keep their insertion order.
pub type Map = IndexMap<String, Value>;

/// A JSON-like value flowing through every pipeline stage.
///
/// Numbers are always `f64`; whole numbers print without a fractional part.
///
/// # Examples
///
/// ```
/// use uql_lang::Value;
///
/// let doc = Value::from(serde_json::json!({"user": {"name": "ada"}}));
/// assert_eq!(doc.get("user.name"), Value::String("ada".into()));
/// assert_eq!(doc.get("user.age"), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Number
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Object with insertion-ordered keys
    Object(Map),
}

impl Value {
    /// Human-readable name of the variant, used in logs and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stringify a value the way group keys and `strcat` see it.
    ///
    /// Null becomes the empty string, containers become compact JSON.
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => crate::output::to_json(self),
        }
    }

    /// Read the nested field addressed by `path`. See [`path::get`].
    pub fn get(&self, path: &str) -> Value {
        path::get(self, &path::parse(path)).cloned().unwrap_or(Value::Null)
    }

    /// Return a copy of `self` with the field at `path` set to `new_value`.
    pub fn set(&self, path: &str, new_value: Value) -> Value {
        let mut result = self.clone();
        result.set_in_place(path, new_value);
        result
    }

    /// Write `new_value` at `path`, creating intermediate objects as needed.
    pub fn set_in_place(&mut self, path: &str, new_value: Value) {
        path::set(self, &path::parse(path), new_value);
    }

    /// Remove the field addressed by `path`. Missing paths are a no-op.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        path::remove(self, &path::parse(path))
    }
}

/// Format a number without a trailing `.0` for whole values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Hashable rendering used to bucket values for grouping and dedup.
///
/// Equal values render the same (object keys are sorted) and values of
/// different types never do, so `1` and `"1"` stay apart.
fn canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&crate::output::to_json(&Value::String(key.clone())));
                out.push(':');
                canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&crate::output::to_json(scalar)),
    }
}

/// Slots for distinct values under deep equality, numbered in order of first
/// insertion.
///
/// Values are bucketed by their canonical rendering; a bucket only holds more
/// than one entry for non-finite numbers, which render as `null`.
#[derive(Debug, Default)]
pub(crate) struct ValueIndex {
    buckets: IndexMap<String, Vec<(Value, usize)>>,
    len: usize,
}

impl ValueIndex {
    /// Slot of `value`, and whether this call created it.
    pub(crate) fn insert(&mut self, value: &Value) -> (usize, bool) {
        let mut key = String::new();
        canonical(value, &mut key);
        let bucket = self.buckets.entry(key).or_default();
        if let Some((_, slot)) = bucket.iter().find(|(seen, _)| seen == value) {
            return (*slot, false);
        }
        let slot = self.len;
        self.len += 1;
        bucket.push((value.clone(), slot));
        (slot, true)
    }
}

/// Total order used by `order by`, `latest` and expression comparisons.
///
/// Numbers compare numerically and strings lexicographically. Values of
/// different variants order by variant rank, with null last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()),
        (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Boolean(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", crate::output::to_json(other)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}
