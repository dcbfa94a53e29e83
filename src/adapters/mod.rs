//! Format adapters: turn an embedded text payload into a [`Value`].
//!
//! Each adapter takes the text and its options and either returns the parsed
//! value or an [`AdapterError`]. A failing adapter stops the pipeline.
//!
//! [`Value`]: crate::Value

pub mod csv;
pub mod json;
pub mod xml;
pub mod yaml;

use thiserror::Error;

/// Errors raised by format adapters and the expression engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// Malformed JSON payload
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Malformed CSV payload
    #[error("invalid CSV: {0}")]
    Csv(String),

    /// Malformed XML payload
    #[error("invalid XML: {0}")]
    Xml(String),

    /// Malformed YAML payload
    #[error("invalid YAML: {0}")]
    Yaml(String),

    /// Expression that failed to parse or evaluate
    #[error("expression error at position {position}: {message}")]
    Expression { message: String, position: usize },
}

impl AdapterError {
    pub(crate) fn expression(message: impl Into<String>, position: usize) -> Self {
        AdapterError::Expression {
            message: message.into(),
            position,
        }
    }
}
