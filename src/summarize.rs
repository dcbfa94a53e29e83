//! Grouping and aggregation for the `summarize` stage.
//!
//! Rows are partitioned by the `by` fields and every metric is computed per
//! partition with the function registry:
//!
//! - one key: rows are grouped by the raw field value;
//! - several keys: rows are grouped by a composite key built from the
//!   stringified field values;
//! - no key: the whole array is a single group and the result is one object.
//!
//! Groups are emitted in order of first occurrence.

use indexmap::IndexMap;
use tracing::trace;

use crate::ast::{FunctionArg, Metric};
use crate::value::{Map, Value, ValueIndex};

/// Summarize `rows` by `by`, computing `metrics` per group.
///
/// # Examples
///
/// ```
/// use uql_lang::Value;
/// use uql_lang::ast::Metric;
/// use uql_lang::functions::Operator;
/// use uql_lang::summarize::summarize;
/// use serde_json::json;
///
/// let rows = Value::from(json!([{"team": "x"}, {"team": "x"}, {"team": "y"}]));
/// let metrics = [Metric { operator: Operator::Count, args: vec![], alias: Some("n".into()) }];
///
/// let result = summarize(rows.as_array().unwrap(), &["team".to_string()], &metrics);
/// assert_eq!(result, Value::from(json!([{"team": "x", "n": 2}, {"team": "y", "n": 1}])));
/// ```
pub fn summarize(rows: &[Value], by: &[String], metrics: &[Metric]) -> Value {
    match by {
        [] => Value::Object(apply_metrics(Map::new(), metrics, rows.to_vec())),
        [key] => {
            let groups = partition_by_value(rows, key);
            trace!(key = %key, groups = groups.len(), "grouped by single key");
            let out = groups
                .into_iter()
                .map(|(group_key, group)| {
                    let mut head = Map::new();
                    head.insert(key.clone(), group_key);
                    Value::Object(apply_metrics(head, metrics, group))
                })
                .collect();
            Value::Array(out)
        }
        keys => {
            let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
            for row in rows {
                let parts: Vec<String> = keys.iter().map(|k| row.get(k).as_string()).collect();
                groups.entry(composite_key(&parts)).or_default().push(row.clone());
            }
            trace!(keys = keys.len(), groups = groups.len(), "grouped by composite key");
            let out = groups
                .into_values()
                .map(|group| {
                    let mut head = Map::new();
                    for key in keys {
                        let first = group.first().map(|row| row.get(key)).unwrap_or_default();
                        head.insert(key.clone(), first);
                    }
                    Value::Object(apply_metrics(head, metrics, group))
                })
                .collect();
            Value::Array(out)
        }
    }
}

/// Join stringified key parts into one key.
///
/// Each part is written as `<char count>:<text>`, so the encoding is
/// injective: `["a:b", "c"]` and `["a", "b:c"]` produce different keys no
/// matter what characters the parts contain.
pub fn composite_key(parts: &[String]) -> String {
    let mut key = String::new();
    for part in parts {
        key.push_str(&part.chars().count().to_string());
        key.push(':');
        key.push_str(part);
    }
    key
}

/// Partition rows by the raw value at `key`, keeping first-occurrence order
/// of groups.
fn partition_by_value(rows: &[Value], key: &str) -> Vec<(Value, Vec<Value>)> {
    let mut index = ValueIndex::default();
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for row in rows {
        let group_key = row.get(key);
        let (slot, created) = index.insert(&group_key);
        if created {
            groups.push((group_key, vec![row.clone()]));
        } else if let Some((_, group)) = groups.get_mut(slot) {
            group.push(row.clone());
        }
    }
    groups
}

fn apply_metrics(mut out: Map, metrics: &[Metric], group: Vec<Value>) -> Map {
    let group = Value::Array(group);
    for metric in metrics {
        let value = metric.operator.apply(&[column(metric, &group)], Some(&group));
        out.insert(metric.target().to_string(), value);
    }
    out
}

/// The values a metric aggregates: its first field argument read from every
/// row, or the rows themselves when it names no field.
fn column(metric: &Metric, group: &Value) -> Value {
    let rows = group.as_array().map(Vec::as_slice).unwrap_or_default();
    let field = metric.args.iter().find_map(|arg| match arg {
        FunctionArg::Ref(field) => Some(field),
        _ => None,
    });
    match field {
        Some(field) => Value::Array(rows.iter().map(|row| row.get(field)).collect()),
        None => group.clone(),
    }
}
