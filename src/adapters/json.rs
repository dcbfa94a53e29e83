//! JSON adapter

use tracing::debug;

use super::AdapterError;
use crate::convert::json_to_value;
use crate::value::Value;

/// Parse a JSON document.
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::adapters::json;
///
/// assert_eq!(json::parse("[1, 2]").unwrap(), Value::from(serde_json::json!([1, 2])));
/// assert!(json::parse("not json").is_err());
/// ```
pub fn parse(text: &str) -> Result<Value, AdapterError> {
    debug!(bytes = text.len(), "parsing JSON payload");
    let parsed: serde_json::Value =
        serde_json::from_str(text).map_err(|e| AdapterError::Json(e.to_string()))?;
    Ok(json_to_value(parsed))
}
