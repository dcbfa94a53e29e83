//! JSON rendering of pipeline results.
//!
//! Keys come out in the order the pipeline produced them. Whole numbers print
//! without a fractional part and non-finite numbers print as `null`.
//!
//! ```
//! use uql_lang::Value;
//! use uql_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::Number(42.0);
//! assert_eq!(to_json(&value), "42");
//! assert_eq!(to_json_pretty(&value), "42");
//! ```

use std::fmt::Write;

use crate::value::{Value, format_number};

/// Streams a [`Value`] into a string buffer.
pub struct JsonPrinter {
    pretty: bool,
    out: String,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter {
            pretty,
            out: String::new(),
        }
    }

    /// Render `value` and hand back the buffer.
    pub fn finish(mut self, value: &Value) -> String {
        self.write_value(value, 0);
        self.out
    }

    fn write_value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if n.is_finite() => self.out.push_str(&format_number(*n)),
            Value::Number(_) => self.out.push_str("null"),
            Value::String(s) => self.write_string(s),
            Value::Array(items) => {
                self.write_container(('[', ']'), items.iter().map(|v| (None, v)), depth)
            }
            Value::Object(map) => self.write_container(
                ('{', '}'),
                map.iter().map(|(k, v)| (Some(k.as_str()), v)),
                depth,
            ),
        }
    }

    fn write_container<'a, I>(&mut self, (open, close): (char, char), entries: I, depth: usize)
    where
        I: ExactSizeIterator<Item = (Option<&'a str>, &'a Value)>,
    {
        if entries.len() == 0 {
            self.out.push(open);
            self.out.push(close);
            return;
        }

        self.out.push(open);
        for (idx, (key, value)) in entries.enumerate() {
            if idx > 0 {
                self.out.push(',');
            }
            self.newline(depth + 1);
            if let Some(key) = key {
                self.write_string(key);
                self.out.push_str(if self.pretty { ": " } else { ":" });
            }
            self.write_value(value, depth + 1);
        }
        self.newline(depth);
        self.out.push(close);
    }

    fn newline(&mut self, depth: usize) {
        if self.pretty {
            self.out.push('\n');
            for _ in 0..depth {
                self.out.push_str("  ");
            }
        }
    }

    fn write_string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if c.is_control() => {
                    // writing into a String cannot fail
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

/// Compact JSON.
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::output::to_json;
///
/// let value = Value::from(serde_json::json!({"name": "Alice", "age": 30, "note": "a\"b"}));
/// assert_eq!(to_json(&value), r#"{"name":"Alice","age":30,"note":"a\"b"}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).finish(value)
}

/// JSON indented by two spaces.
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::output::to_json_pretty;
///
/// let value = Value::from(serde_json::json!({"name": "Alice", "tags": ["a"], "none": []}));
/// assert_eq!(
///     to_json_pretty(&value),
///     "{\n  \"name\": \"Alice\",\n  \"tags\": [\n    \"a\"\n  ],\n  \"none\": []\n}"
/// );
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).finish(value)
}
