// tests/adapter_tests.rs

use serde_json::json;
use uql_lang::adapters::{AdapterError, csv, json as json_adapter, xml, yaml};
use uql_lang::ast::{CsvOptions, XmlOptions};
use uql_lang::Value;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_json_keeps_key_order() {
    let parsed = json_adapter::parse(r#"{"z": 1, "a": 2, "m": [true, null]}"#).unwrap();
    let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_json_scalars() {
    assert_eq!(json_adapter::parse("3.5").unwrap(), Value::Number(3.5));
    assert_eq!(json_adapter::parse(r#""x""#).unwrap(), Value::from("x"));
}

#[test]
fn test_json_error() {
    assert!(matches!(json_adapter::parse("{"), Err(AdapterError::Json(_))));
}

// ============================================================================
// CSV
// ============================================================================

#[test]
fn test_csv_records() {
    let parsed = csv::parse("a,b\n1,2\n", &CsvOptions::default()).unwrap();
    assert_eq!(parsed, v(json!([["a", "b"], ["1", "2"]])));
}

#[test]
fn test_csv_columns() {
    let options = CsvOptions {
        columns: true,
        ..CsvOptions::default()
    };
    let parsed = csv::parse("name,age\nada,36\nbob,41", &options).unwrap();
    assert_eq!(
        parsed,
        v(json!([
            {"name": "ada", "age": "36"},
            {"name": "bob", "age": "41"},
        ]))
    );
}

#[test]
fn test_csv_columns_header_only() {
    let options = CsvOptions {
        columns: true,
        ..CsvOptions::default()
    };
    assert_eq!(csv::parse("a,b\n", &options).unwrap(), v(json!([])));
    assert_eq!(csv::parse("", &options).unwrap(), v(json!([])));
}

#[test]
fn test_csv_delimiter_and_comment() {
    let options = CsvOptions {
        delimiter: b';',
        comment: Some(b'#'),
        ..CsvOptions::default()
    };
    let parsed = csv::parse("# generated\na;b\nc;d", &options).unwrap();
    assert_eq!(parsed, v(json!([["a", "b"], ["c", "d"]])));
}

#[test]
fn test_csv_quoted_fields() {
    let parsed = csv::parse("\"a,b\",\"say \"\"hi\"\"\"", &CsvOptions::default()).unwrap();
    assert_eq!(parsed, v(json!([["a,b", "say \"hi\""]])));
}

#[test]
fn test_csv_skip_empty_lines() {
    let text = "a,b\n,\nc,d";
    let kept = csv::parse(text, &CsvOptions::default()).unwrap();
    assert_eq!(kept.as_array().unwrap().len(), 3);

    let options = CsvOptions {
        skip_empty_lines: true,
        ..CsvOptions::default()
    };
    let skipped = csv::parse(text, &options).unwrap();
    assert_eq!(skipped, v(json!([["a", "b"], ["c", "d"]])));
}

#[test]
fn test_csv_ragged_rows_need_relax() {
    let text = "a,b\n1,2,3";
    assert!(matches!(
        csv::parse(text, &CsvOptions::default()),
        Err(AdapterError::Csv(_))
    ));

    let options = CsvOptions {
        columns: true,
        relax_column_count: true,
        ..CsvOptions::default()
    };
    assert_eq!(
        csv::parse(text, &options).unwrap(),
        v(json!([{"a": "1", "b": "2", "col2": "3"}]))
    );
}

// ============================================================================
// XML
// ============================================================================

#[test]
fn test_xml_nested_elements() {
    let parsed = xml::parse(
        "<order><id>7</id><customer><name>ada</name></customer></order>",
        &XmlOptions::default(),
    )
    .unwrap();
    assert_eq!(parsed, v(json!({"order": {"id": 7, "customer": {"name": "ada"}}})));
}

#[test]
fn test_xml_repeated_tags_become_array() {
    let parsed = xml::parse(
        "<list><item>a</item><item>b</item><item>c</item></list>",
        &XmlOptions::default(),
    )
    .unwrap();
    assert_eq!(parsed, v(json!({"list": {"item": ["a", "b", "c"]}})));
}

#[test]
fn test_xml_attributes_are_dropped_by_default() {
    let parsed = xml::parse(r#"<user id="1">ada</user>"#, &XmlOptions::default()).unwrap();
    assert_eq!(parsed, v(json!({"user": "ada"})));
}

#[test]
fn test_xml_attributes_with_prefix_and_text_node() {
    let options = XmlOptions {
        attributes: true,
        ..XmlOptions::default()
    };
    let parsed = xml::parse(
        r#"<users><user id="1">ada</user><user id="2">bob</user></users>"#,
        &options,
    )
    .unwrap();
    assert_eq!(
        parsed,
        v(json!({"users": {"user": [
            {"@_id": 1, "#text": "ada"},
            {"@_id": 2, "#text": "bob"},
        ]}}))
    );
}

#[test]
fn test_xml_custom_prefix_and_text_node_name() {
    let options = XmlOptions {
        attributes: true,
        attribute_prefix: "$".to_string(),
        text_node_name: "value".to_string(),
        ..XmlOptions::default()
    };
    let parsed = xml::parse(r#"<price currency="EUR">9.5</price>"#, &options).unwrap();
    assert_eq!(parsed, v(json!({"price": {"$currency": "EUR", "value": 9.5}})));
}

#[test]
fn test_xml_empty_element_with_attributes() {
    let options = XmlOptions {
        attributes: true,
        ..XmlOptions::default()
    };
    let parsed = xml::parse(r#"<flag on="true"/>"#, &options).unwrap();
    assert_eq!(parsed, v(json!({"flag": {"@_on": true}})));
}

#[test]
fn test_xml_parse_values_off_keeps_strings() {
    let options = XmlOptions {
        parse_values: false,
        ..XmlOptions::default()
    };
    let parsed = xml::parse("<a><n>42</n><b>true</b></a>", &options).unwrap();
    assert_eq!(parsed, v(json!({"a": {"n": "42", "b": "true"}})));
}

#[test]
fn test_xml_entities_and_cdata() {
    let parsed = xml::parse(
        "<a><t>fish &amp; chips</t><c><![CDATA[<raw>]]></c></a>",
        &XmlOptions::default(),
    )
    .unwrap();
    assert_eq!(parsed, v(json!({"a": {"t": "fish & chips", "c": "<raw>"}})));
}

#[test]
fn test_xml_malformed() {
    assert!(matches!(
        xml::parse("<a><b></a>", &XmlOptions::default()),
        Err(AdapterError::Xml(_))
    ));
    assert!(xml::parse("<a><b>1</b>", &XmlOptions::default()).is_err());
}

// ============================================================================
// YAML
// ============================================================================

#[test]
fn test_yaml_mapping_and_sequence() {
    let parsed = yaml::parse("name: ada\ntags:\n  - a\n  - b\nage: 36\nactive: true\n").unwrap();
    assert_eq!(
        parsed,
        v(json!({"name": "ada", "tags": ["a", "b"], "age": 36, "active": true}))
    );
}

#[test]
fn test_yaml_nulls() {
    assert_eq!(yaml::parse("a: ~\nb: null").unwrap(), v(json!({"a": null, "b": null})));
}

#[test]
fn test_yaml_error() {
    assert!(matches!(yaml::parse("a: [1, 2"), Err(AdapterError::Yaml(_))));
}
