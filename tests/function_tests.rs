// tests/function_tests.rs

use serde_json::json;
use uql_lang::Value;
use uql_lang::functions::{Arity, Operator, Shape, UnknownOperator};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_every_operator_round_trips_its_name() {
    for op in Operator::all() {
        assert_eq!(op.name().parse::<Operator>(), Ok(*op));
    }
    assert_eq!(Operator::all().len(), 20);
}

#[test]
fn test_unknown_operator() {
    assert_eq!(
        "median".parse::<Operator>(),
        Err(UnknownOperator("median".to_string()))
    );
}

#[test]
fn test_arity_and_shape() {
    assert_eq!(Operator::Random.arity(), Arity::Zero);
    assert_eq!(Operator::Random.shape(), Shape::Nothing);
    assert_eq!(Operator::Diff.arity(), Arity::Binary);
    assert_eq!(Operator::ToUpper.shape(), Shape::String);
    assert_eq!(Operator::Sum.shape(), Shape::Array);
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_count() {
    assert_eq!(Operator::Count.apply_to(&v(json!([1, 2, 3]))), num(3.0));
    assert_eq!(Operator::Count.apply_to(&v(json!("héllo"))), num(5.0));
    assert_eq!(Operator::Count.apply_to(&v(json!({"a": 1}))), v(json!({"a": 1})));
}

#[test]
fn test_sum_skips_nulls_and_uses_decimal() {
    assert_eq!(Operator::Sum.apply_to(&v(json!([1, null, 2]))), num(3.0));
    assert_eq!(Operator::Sum.apply_to(&v(json!([0.1, 0.2]))), num(0.3));
    assert_eq!(Operator::Sum.apply_to(&v(json!([]))), num(0.0));
}

#[test]
fn test_sum_of_mixed_values_is_unchanged() {
    let input = v(json!([1, "two"]));
    assert_eq!(Operator::Sum.apply_to(&input), input);
}

#[test]
fn test_mean_min_max() {
    let input = v(json!([4, 1, 7]));
    assert_eq!(Operator::Mean.apply_to(&input), num(4.0));
    assert_eq!(Operator::Min.apply_to(&input), num(1.0));
    assert_eq!(Operator::Max.apply_to(&input), num(7.0));
}

#[test]
fn test_mean_min_max_of_empty_array_is_null() {
    let empty = v(json!([]));
    assert_eq!(Operator::Mean.apply_to(&empty), Value::Null);
    assert_eq!(Operator::Min.apply_to(&empty), Value::Null);
    assert_eq!(Operator::Max.apply_to(&empty), Value::Null);
}

#[test]
fn test_diff_and_mul_need_two_numbers() {
    assert_eq!(Operator::Diff.apply_to(&v(json!([10, 4]))), num(6.0));
    assert_eq!(Operator::Mul.apply_to(&v(json!([1.1, 3]))), num(3.3));

    let three = v(json!([1, 2, 3]));
    assert_eq!(Operator::Diff.apply_to(&three), three);
    let text = v(json!(["a", 1]));
    assert_eq!(Operator::Mul.apply_to(&text), text);
}

#[test]
fn test_first_last() {
    let input = v(json!(["a", "b", "c"]));
    assert_eq!(Operator::First.apply_to(&input), Value::from("a"));
    assert_eq!(Operator::Last.apply_to(&input), Value::from("c"));

    let empty = v(json!([]));
    assert_eq!(Operator::First.apply_to(&empty), empty);
}

#[test]
fn test_latest_of_orderable_values_is_the_greatest() {
    let dates = v(json!(["2024-03-01", "2024-05-10", "2023-12-31"]));
    assert_eq!(Operator::Latest.apply_to(&dates), Value::from("2024-05-10"));
    assert_eq!(Operator::Latest.apply_to(&v(json!([3, 9, 2]))), num(9.0));
}

#[test]
fn test_latest_of_mixed_values_is_the_last() {
    let mixed = v(json!([3, "b", {"x": 1}]));
    assert_eq!(Operator::Latest.apply_to(&mixed), v(json!({"x": 1})));
}

#[test]
fn test_strcat() {
    assert_eq!(
        Operator::Strcat.apply_to(&v(json!(["a", 1, true, "b"]))),
        Value::from("a1trueb")
    );
    let nested = v(json!(["a", ["b"]]));
    assert_eq!(Operator::Strcat.apply_to(&nested), nested);
}

#[test]
fn test_distinct_and_dcount_use_deep_equality() {
    let input = v(json!([{"a": 1}, 2, {"a": 1}, 2, "2"]));
    assert_eq!(Operator::Distinct.apply_to(&input), v(json!([{"a": 1}, 2, "2"])));
    assert_eq!(Operator::Dcount.apply_to(&input), num(3.0));
}

#[test]
fn test_distinct_over_many_values() {
    let items: Vec<Value> = (0..40_000).map(|i| num((i % 20_000) as f64)).collect();
    let distinct = Operator::Distinct.apply_to(&Value::Array(items.clone()));
    assert_eq!(distinct.as_array().unwrap().len(), 20_000);
    assert_eq!(distinct.as_array().unwrap()[19_999], num(19_999.0));
    assert_eq!(Operator::Dcount.apply_to(&Value::Array(items)), num(20_000.0));
}

#[test]
fn test_random_is_in_unit_interval() {
    for _ in 0..100 {
        let Value::Number(n) = Operator::Random.apply(&[], None) else {
            panic!("random must return a number");
        };
        assert!((0.0..1.0).contains(&n));
    }
}

// ============================================================================
// String operators
// ============================================================================

#[test]
fn test_string_operators() {
    let input = Value::from("  Hello World ");
    assert_eq!(Operator::ToUpper.apply_to(&input), Value::from("  HELLO WORLD "));
    assert_eq!(Operator::ToLower.apply_to(&input), Value::from("  hello world "));
    assert_eq!(Operator::Trim.apply_to(&input), Value::from("Hello World"));
    assert_eq!(Operator::TrimStart.apply_to(&input), Value::from("Hello World "));
    assert_eq!(Operator::TrimEnd.apply_to(&input), Value::from("  Hello World"));
    assert_eq!(Operator::Strlen.apply_to(&input), num(14.0));
}

#[test]
fn test_string_operators_leave_other_shapes_alone() {
    let input = v(json!([1, 2]));
    assert_eq!(Operator::ToUpper.apply_to(&input), input);
    assert_eq!(Operator::Strlen.apply_to(&num(5.0)), num(5.0));
}

// ============================================================================
// Argument normalization
// ============================================================================

#[test]
fn test_apply_builds_array_from_arguments() {
    assert_eq!(Operator::Sum.apply(&[num(1.0), num(2.0), num(3.0)], None), num(6.0));
    assert_eq!(Operator::Max.apply(&[num(1.0), num(5.0)], None), num(5.0));
}

#[test]
fn test_apply_uses_single_array_argument() {
    assert_eq!(Operator::Sum.apply(&[v(json!([1, 2]))], None), num(3.0));
}

#[test]
fn test_apply_falls_back_to_context() {
    let group = v(json!([{"a": 1}, {"a": 2}]));
    assert_eq!(Operator::Count.apply(&[], Some(&group)), num(2.0));
    assert_eq!(Operator::Count.apply(&[], None), num(0.0));
}

#[test]
fn test_apply_string_operator_takes_first_argument() {
    assert_eq!(
        Operator::ToUpper.apply(&[Value::from("abc")], None),
        Value::from("ABC")
    );
}

#[test]
fn test_count_of_single_string_argument_counts_chars() {
    assert_eq!(Operator::Count.apply(&[Value::from("abcd")], None), num(4.0));
}
