// tests/integration_tests.rs
//
// Whole queries from text to value, plus the pipeline-wide properties.

use std::sync::Arc;

use serde_json::json;
use uql_lang::ast::{Metric, ProjectItem, Stage};
use uql_lang::expression::{Evaluated, ExpressionEngine};
use uql_lang::functions::Operator;
use uql_lang::{
    AdapterError, EMPTY_QUERY_MESSAGE, EvalError, Evaluator, QueryError, Uql, Value, run_query,
    to_json,
};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn test_project_example() {
    let stages = vec![Stage::Project(vec![ProjectItem::Ref {
        field: "name".to_string(),
        alias: None,
    }])];
    let input = v(json!([{"name": "a", "age": 1}, {"name": "b", "age": 2}]));
    let result = Evaluator::new().eval_stages(&stages, input).unwrap();
    assert_eq!(result, v(json!([{"name": "a"}, {"name": "b"}])));
}

#[test]
fn test_summarize_example() {
    let stages = vec![Stage::Summarize {
        by: vec!["team".to_string()],
        metrics: vec![Metric {
            operator: Operator::Count,
            args: vec![],
            alias: Some("n".to_string()),
        }],
    }];
    let input = v(json!([{"team": "x"}, {"team": "x"}, {"team": "y"}]));
    let result = Evaluator::new().eval_stages(&stages, input).unwrap();
    assert_eq!(result, v(json!([{"team": "x", "n": 2}, {"team": "y", "n": 1}])));
}

#[test]
fn test_mv_expand_example() {
    let stages = vec![Stage::MvExpand {
        field: "tags".to_string(),
        alias: None,
    }];
    let input = v(json!([{"id": 1, "tags": ["a", "b"]}]));
    let result = Evaluator::new().eval_stages(&stages, input).unwrap();
    assert_eq!(result, v(json!([{"id": 1, "tags": "a"}, {"id": 1, "tags": "b"}])));
}

#[test]
fn test_empty_query_returns_friendly_message() {
    assert_eq!(run_query("", None).unwrap(), Value::from(EMPTY_QUERY_MESSAGE));
    assert_eq!(
        run_query("  \n\t ", Some(v(json!([1])))).unwrap(),
        Value::from(EMPTY_QUERY_MESSAGE)
    );
}

#[test]
fn test_parse_json_over_garbage_aborts() {
    let err = run_query("parse-json", Some(Value::from("not json"))).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Eval(EvalError::Adapter {
            stage: "parse-json",
            source: AdapterError::Json(_)
        })
    ));
    assert!(err.to_string().starts_with("evaluation error: parse-json failed: invalid JSON"));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_comment_only_queries_return_input() {
    let inputs = [json!(null), json!("text"), json!([1, {"a": 2}]), json!({"k": [true]})];
    for input in inputs {
        let out = run_query("# one\n# two", Some(v(input.clone()))).unwrap();
        assert_eq!(out, v(input));
    }
}

#[test]
fn test_missing_input_is_null() {
    assert_eq!(run_query("# just a note", None).unwrap(), Value::Null);
}

#[test]
fn test_summarize_groups_match_distinct_keys() {
    let input = json!([
        {"k": "a", "v": 1},
        {"k": "b", "v": 2},
        {"k": "a", "v": 3},
        {"v": 4},
    ]);
    let groups = run_query(r#"summarize count() by "k""#, Some(v(input.clone()))).unwrap();
    let distinct = run_query(r#"distinct "k""#, Some(v(input))).unwrap();

    let group_keys: Vec<Value> = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|group| group.get("k"))
        .collect();
    assert_eq!(Value::Array(group_keys), distinct);
}

// ============================================================================
// Longer pipelines
// ============================================================================

#[test]
fn test_csv_report() {
    let csv = "team,player,score\nred,ada,3\nblue,bob,5\nred,cy,4\n";
    let query = r#"
        # scores arrive as text
        parse-csv --columns
        | summarize "players"=count() by "team"
        | order by "players" desc
    "#;
    assert_eq!(
        run_query(query, Some(Value::from(csv))).unwrap(),
        v(json!([{"team": "red", "players": 2}, {"team": "blue", "players": 1}]))
    );
}

#[test]
fn test_json_payload_reshaping() {
    let payload = r#"{"data": {"users": [
        {"name": "ada", "roles": ["admin", "dev"], "secret": 1},
        {"name": "bob", "roles": ["dev"], "secret": 2}
    ]}}"#;
    let query = r#"parse-json
        | scope "data.users"
        | project-away "secret"
        | mv-expand "role"="roles"
        | extend "label"=strcat("name", '/', "role")
        | project "label"
        | limit 2"#;
    assert_eq!(
        run_query(query, Some(Value::from(payload))).unwrap(),
        v(json!([{"label": "ada/admin"}, {"label": "ada/dev"}]))
    );
}

#[test]
fn test_xml_to_expression() {
    let xml = "<cart><item><price>4</price></item><item><price>6</price></item></cart>";
    let query = r#"parse-xml | jsonata '$sum(cart.item.price)'"#;
    assert_eq!(run_query(query, Some(Value::from(xml))).unwrap(), Value::Number(10.0));
}

#[test]
fn test_yaml_then_distinct() {
    let yaml = "- lang: rust\n- lang: go\n- lang: rust\n";
    assert_eq!(
        run_query(r#"parse-yaml | distinct "lang" | count"#, Some(Value::from(yaml))).unwrap(),
        Value::Number(2.0)
    );
}

#[test]
fn test_output_serialization() {
    let result = run_query(r#"echo 3 | ping 2.5"#, None).unwrap();
    assert_eq!(to_json(&result), "2.5");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_parse_errors_surface_verbatim() {
    let err = run_query("count | frobnicate", Some(v(json!([])))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "parse error: unknown command 'frobnicate' at line 1, column 9"
    );
}

#[test]
fn test_adapter_failure_stops_later_stages() {
    let err = run_query("parse-yaml | hello", Some(Value::from("a: [1"))).unwrap_err();
    assert!(matches!(err, QueryError::Eval(EvalError::Adapter { stage: "parse-yaml", .. })));
}

// ============================================================================
// Pluggable expression engine
// ============================================================================

struct Fixed;

impl ExpressionEngine for Fixed {
    fn evaluate(&self, expr: &str, _input: &Value) -> Result<Evaluated, AdapterError> {
        Ok(Evaluated::Value(Value::from(format!("saw {}", expr))))
    }
}

#[test]
fn test_custom_engine() {
    let uql = Uql::with_engine(Arc::new(Fixed));
    assert_eq!(uql.run("jsonata 'a.b' | toupper", None).unwrap(), Value::from("SAW A.B"));
}

#[test]
fn test_concurrent_runs_share_a_runner() {
    let uql = Uql::new();
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let uql = uql.clone();
            std::thread::spawn(move || {
                let input = Value::Array((0..10).map(|i| Value::from(i as f64)).collect());
                uql.run(&format!("limit {} | sum", n), Some(input)).unwrap()
            })
        })
        .collect();
    let sums: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        sums,
        vec![Value::Number(0.0), Value::Number(0.0), Value::Number(1.0), Value::Number(3.0)]
    );
}
