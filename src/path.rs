//! Field paths used by `scope`, `project`, `extend` and friends.
//!
//! A path is written with dots and optional brackets:
//!
//! ```text
//! user.name
//! items[0].price
//! items.0.price         // same as above
//! meta["content-type"]  // quoted key
//! ```
//!
//! Reads never fail: a missing segment, or a value that cannot be indexed,
//! yields nothing. Writes create intermediate objects along the way.

use crate::value::{Map, Value};

/// A segment in a navigable path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `name` → `Field("name")`
    /// - `user.email` → `[Field("user"), Field("email")]`
    /// - `meta["a.b"]` → `[Field("meta"), Field("a.b")]`
    Field(String),

    /// Array element access by index
    ///
    /// # Examples
    /// - `items[0]` → `[Field("items"), Index(0)]`
    /// - `items.2` → `[Field("items"), Index(2)]`
    Index(usize),
}

impl PathSegment {
    /// The segment as an object key. Indices on objects address the key
    /// spelled by the number (`["0"]`).
    fn key(&self) -> String {
        match self {
            PathSegment::Field(name) => name.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

/// A sequence of path segments.
pub type Path = Vec<PathSegment>;

/// Split a path string into segments.
///
/// # Examples
///
/// ```
/// use uql_lang::path::{parse, PathSegment};
///
/// assert_eq!(
///     parse("items[0].price"),
///     vec![
///         PathSegment::Field("items".into()),
///         PathSegment::Index(0),
///         PathSegment::Field("price".into()),
///     ]
/// );
/// ```
pub fn parse(path: &str) -> Path {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush(&mut current, &mut segments),
            '[' => {
                flush(&mut current, &mut segments);
                let mut inner = String::new();
                let mut quote = None;
                for c in chars.by_ref() {
                    match (quote, c) {
                        (None, ']') => break,
                        (None, '"' | '\'') if inner.is_empty() => quote = Some(c),
                        (Some(q), c) if c == q => quote = None,
                        (_, c) => inner.push(c),
                    }
                }
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) => segments.push(PathSegment::Field(inner)),
                }
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut segments);
    segments
}

fn flush(current: &mut String, segments: &mut Path) {
    if current.is_empty() {
        return;
    }
    let text = std::mem::take(current);
    match text.parse::<usize>() {
        Ok(index) => segments.push(PathSegment::Index(index)),
        Err(_) => segments.push(PathSegment::Field(text)),
    }
}

/// Resolve `path` against `value`. An empty path addresses the value itself.
pub fn get<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let Some((segment, rest)) = path.split_first() else {
        return Some(value);
    };

    let child = match (value, segment) {
        (Value::Object(map), segment) => map.get(&segment.key()),
        (Value::Array(arr), PathSegment::Index(i)) => arr.get(*i),
        _ => None,
    }?;

    get(child, rest)
}

/// Write `new_value` at `path`.
///
/// Missing intermediate fields become empty objects, and so do scalars found
/// in the middle of the path. A scalar root has nothing to write into and is
/// left untouched. An array index can address an existing element or the
/// slot right after the last one; anything further out is ignored.
pub fn set(current: &mut Value, path: &[PathSegment], new_value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *current = new_value;
        return;
    };

    match (current, segment) {
        (Value::Object(map), segment) => {
            let key = segment.key();
            if rest.is_empty() {
                map.insert(key, new_value);
                return;
            }
            let child = map.entry(key).or_insert(Value::Null);
            if !matches!(child, Value::Object(_) | Value::Array(_)) {
                *child = Value::Object(Map::new());
            }
            set(child, rest, new_value);
        }
        (Value::Array(arr), PathSegment::Index(i)) => {
            // Writes may append one element but never pad a gap.
            if *i == arr.len() {
                arr.push(Value::Null);
            }
            let Some(child) = arr.get_mut(*i) else {
                return;
            };
            if rest.is_empty() {
                *child = new_value;
                return;
            }
            if !matches!(child, Value::Object(_) | Value::Array(_)) {
                *child = Value::Object(Map::new());
            }
            set(child, rest, new_value);
        }
        _ => {} // no-op
    }
}

/// Remove the value at `path`. Silent no-op if the path doesn't exist.
pub fn remove(current: &mut Value, path: &[PathSegment]) -> Option<Value> {
    let (segment, rest) = path.split_first()?;

    if rest.is_empty() {
        return match (current, segment) {
            (Value::Object(map), segment) => map.shift_remove(&segment.key()),
            (Value::Array(arr), PathSegment::Index(i)) if *i < arr.len() => Some(arr.remove(*i)),
            _ => None,
        };
    }

    match (current, segment) {
        (Value::Object(map), segment) => map
            .get_mut(&segment.key())
            .and_then(|child| remove(child, rest)),
        (Value::Array(arr), PathSegment::Index(i)) => {
            arr.get_mut(*i).and_then(|child| remove(child, rest))
        }
        _ => None,
    }
}
