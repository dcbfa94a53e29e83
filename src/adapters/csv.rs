//! CSV adapter

use tracing::debug;

use super::AdapterError;
use crate::ast::CsvOptions;
use crate::value::{Map, Value};

/// Parse CSV text.
///
/// Without `columns` the result is an array of records, each an array of
/// strings. With `columns` the first record names the fields and every other
/// record becomes an object; fields beyond the header are named `col<index>`.
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::adapters::csv;
/// use uql_lang::ast::CsvOptions;
/// use serde_json::json;
///
/// let rows = csv::parse("a,b\n1,2", &CsvOptions::default()).unwrap();
/// assert_eq!(rows, Value::from(json!([["a", "b"], ["1", "2"]])));
/// ```
pub fn parse(text: &str, options: &CsvOptions) -> Result<Value, AdapterError> {
    debug!(bytes = text.len(), columns = options.columns, "parsing CSV payload");

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .comment(options.comment)
        .flexible(options.relax_column_count)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AdapterError::Csv(e.to_string()))?;
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        if options.skip_empty_lines && fields.iter().all(String::is_empty) {
            continue;
        }
        records.push(fields);
    }

    if !options.columns {
        return Ok(Value::Array(
            records
                .into_iter()
                .map(|fields| Value::Array(fields.into_iter().map(Value::String).collect()))
                .collect(),
        ));
    }

    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        return Ok(Value::Array(Vec::new()));
    };

    let rows = records
        .map(|fields| {
            let mut row = Map::new();
            for (idx, value) in fields.into_iter().enumerate() {
                let key = header
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("col{idx}"));
                row.insert(key, Value::String(value));
            }
            Value::Object(row)
        })
        .collect();
    Ok(Value::Array(rows))
}
