//! YAML adapter

use tracing::debug;

use super::AdapterError;
use crate::convert::json_to_value;
use crate::value::Value;

/// Parse a YAML document.
///
/// Mapping keys must be strings.
pub fn parse(text: &str) -> Result<Value, AdapterError> {
    debug!(bytes = text.len(), "parsing YAML payload");
    let parsed: serde_json::Value =
        serde_yml::from_str(text).map_err(|e| AdapterError::Yaml(e.to_string()))?;
    Ok(json_to_value(parsed))
}
