// tests/summarize_tests.rs

use serde_json::json;
use uql_lang::Value;
use uql_lang::ast::{FunctionArg, Metric};
use uql_lang::functions::Operator;
use uql_lang::summarize::{composite_key, summarize};

fn rows(json: serde_json::Value) -> Vec<Value> {
    match Value::from(json) {
        Value::Array(items) => items,
        other => panic!("expected array, got {:?}", other),
    }
}

fn metric(operator: Operator, field: Option<&str>, alias: Option<&str>) -> Metric {
    Metric {
        operator,
        args: field.map(|f| vec![FunctionArg::Ref(f.to_string())]).unwrap_or_default(),
        alias: alias.map(str::to_string),
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Single key
// ============================================================================

#[test]
fn test_count_by_team() {
    let input = rows(json!([{"team": "x"}, {"team": "x"}, {"team": "y"}]));
    let result = summarize(&input, &keys(&["team"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(result, Value::from(json!([{"team": "x", "n": 2}, {"team": "y", "n": 1}])));
}

#[test]
fn test_groups_keep_first_occurrence_order() {
    let input = rows(json!([{"k": "b"}, {"k": "a"}, {"k": "b"}, {"k": "c"}]));
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, None)]);
    assert_eq!(
        result,
        Value::from(json!([{"k": "b", "count": 2}, {"k": "a", "count": 1}, {"k": "c", "count": 1}]))
    );
}

#[test]
fn test_single_key_groups_by_raw_value() {
    // 1 and "1" are different keys
    let input = rows(json!([{"k": 1}, {"k": "1"}, {"k": 1}]));
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(result, Value::from(json!([{"k": 1, "n": 2}, {"k": "1", "n": 1}])));
}

#[test]
fn test_missing_key_groups_under_null() {
    let input = rows(json!([{"k": "a"}, {"other": 1}, {"k": null}]));
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(result, Value::from(json!([{"k": "a", "n": 1}, {"k": null, "n": 2}])));
}

#[test]
fn test_metrics_over_a_column() {
    let input = rows(json!([
        {"team": "x", "age": 30},
        {"team": "x", "age": 40},
        {"team": "y", "age": 20},
    ]));
    let metrics = [
        metric(Operator::Mean, Some("age"), Some("avg")),
        metric(Operator::Max, Some("age"), None),
        metric(Operator::Distinct, Some("team"), Some("teams")),
    ];
    let result = summarize(&input, &keys(&["team"]), &metrics);
    assert_eq!(
        result,
        Value::from(json!([
            {"team": "x", "avg": 35, "max": 40, "teams": ["x"]},
            {"team": "y", "avg": 20, "max": 20, "teams": ["y"]},
        ]))
    );
}

#[test]
fn test_nested_key_path() {
    let input = rows(json!([{"a": {"b": 1}}, {"a": {"b": 1}}]));
    let result = summarize(&input, &keys(&["a.b"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(result, Value::from(json!([{"a.b": 1, "n": 2}])));
}

// ============================================================================
// Multiple keys
// ============================================================================

#[test]
fn test_two_keys() {
    let input = rows(json!([
        {"team": "x", "city": "a", "v": 1},
        {"team": "x", "city": "b", "v": 2},
        {"team": "x", "city": "a", "v": 3},
    ]));
    let result = summarize(
        &input,
        &keys(&["team", "city"]),
        &[metric(Operator::Sum, Some("v"), Some("total"))],
    );
    assert_eq!(
        result,
        Value::from(json!([
            {"team": "x", "city": "a", "total": 4},
            {"team": "x", "city": "b", "total": 2},
        ]))
    );
}

#[test]
fn test_composite_keys_do_not_collide() {
    // Joining with a plain separator would merge these two groups
    let input = rows(json!([
        {"a": "x:y", "b": "z"},
        {"a": "x", "b": "y:z"},
    ]));
    let result = summarize(&input, &keys(&["a", "b"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(
        result,
        Value::from(json!([
            {"a": "x:y", "b": "z", "n": 1},
            {"a": "x", "b": "y:z", "n": 1},
        ]))
    );
}

#[test]
fn test_composite_key_encoding() {
    let ab = composite_key(&["a:b".to_string(), "c".to_string()]);
    let a_bc = composite_key(&["a".to_string(), "b:c".to_string()]);
    assert_ne!(ab, a_bc);
    assert_eq!(ab, "3:a:b1:c");
}

// ============================================================================
// No key
// ============================================================================

#[test]
fn test_no_key_summarizes_whole_array() {
    let input = rows(json!([{"v": 1}, {"v": 2}, {"v": 3}]));
    let metrics = [
        metric(Operator::Count, None, Some("n")),
        metric(Operator::Sum, Some("v"), Some("total")),
    ];
    let result = summarize(&input, &[], &metrics);
    assert_eq!(result, Value::from(json!({"n": 3, "total": 6})));
}

#[test]
fn test_no_key_over_empty_array() {
    let metrics = [
        metric(Operator::Count, None, Some("n")),
        metric(Operator::Mean, Some("v"), Some("avg")),
    ];
    let result = summarize(&[], &[], &metrics);
    assert_eq!(result, Value::from(json!({"n": 0, "avg": null})));
}

#[test]
fn test_group_count_matches_distinct_keys() {
    let input = rows(json!([
        {"k": 1}, {"k": 2}, {"k": 1}, {"k": 3}, {"k": 2}, {"k": 1}
    ]));
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, None)]);
    let groups = result.as_array().unwrap();
    assert_eq!(groups.len(), 3);
    for group in groups {
        let k = group.get("k");
        assert!(input.iter().any(|row| row.get("k") == k));
    }
}

#[test]
fn test_many_distinct_keys() {
    let n = 20_000;
    let input: Vec<Value> = (0..n)
        .map(|i| Value::from(json!({"k": i % (n / 2), "tag": format!("t{}", i)})))
        .collect();
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, Some("n"))]);
    let groups = result.as_array().unwrap();
    assert_eq!(groups.len(), n / 2);
    assert_eq!(groups[0], Value::from(json!({"k": 0, "n": 2})));
    assert_eq!(groups[n / 2 - 1], Value::from(json!({"k": n / 2 - 1, "n": 2})));

    let result = summarize(
        &input,
        &keys(&["k", "tag"]),
        &[metric(Operator::Count, None, Some("n"))],
    );
    assert_eq!(result.as_array().unwrap().len(), n);
}

#[test]
fn test_object_keys_group_regardless_of_field_order() {
    let input = rows(json!([
        {"k": {"a": 1, "b": 2}},
        {"k": {"b": 2, "a": 1}},
    ]));
    let result = summarize(&input, &keys(&["k"]), &[metric(Operator::Count, None, Some("n"))]);
    assert_eq!(result, Value::from(json!([{"k": {"a": 1, "b": 2}, "n": 2}])));
}
