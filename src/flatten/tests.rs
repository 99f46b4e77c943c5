//! Tests for flatten module

use super::*;
use crate::types::ArrayPolicy;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn names(record: &FlatRecord) -> Vec<&str> {
    record.column_names().collect()
}

// ============================================================================
// Explode Policy Tests
// ============================================================================

#[test]
fn test_flatten_nested_object() {
    let flattener = Flattener::default();
    let record = flattener.flatten(&json!({"a": 1, "b": {"c": 2, "d": {"e": "x"}}}));

    assert_eq!(names(&record), vec!["a", "b.c", "b.d.e"]);
    assert_eq!(record.get("a"), Some(&json!(1)));
    assert_eq!(record.get("b.c"), Some(&json!(2)));
    assert_eq!(record.get("b.d.e"), Some(&json!("x")));
}

#[test]
fn test_flatten_explode_arrays() {
    let flattener = Flattener::new(ArrayPolicy::Explode);
    let record = flattener.flatten(&json!({"tags": ["a", "b"], "pts": [{"x": 1}, {"x": 2}]}));

    assert_eq!(names(&record), vec!["tags.0", "tags.1", "pts.0.x", "pts.1.x"]);
    assert_eq!(record.get("pts.1.x"), Some(&json!(2)));
}

#[test]
fn test_flatten_empty_containers_have_no_columns() {
    let flattener = Flattener::new(ArrayPolicy::Explode);
    let record = flattener.flatten(&json!({"a": {}, "b": [], "c": 1}));
    assert_eq!(names(&record), vec!["c"]);

    assert!(flattener.flatten(&json!({})).is_empty());
    assert!(flattener.flatten(&json!([])).is_empty());
}

#[test]
fn test_flatten_keeps_nulls() {
    let record = Flattener::default().flatten(&json!({"a": null, "b": {"c": null}}));
    assert_eq!(names(&record), vec!["a", "b.c"]);
    assert_eq!(record.get("b.c"), Some(&Value::Null));
}

#[test]
fn test_flatten_top_level_scalar() {
    let flattener = Flattener::default();
    let record = flattener.flatten(&json!(42));
    assert_eq!(names(&record), vec!["value"]);
    assert_eq!(record.get("value"), Some(&json!(42)));

    let record = flattener.with_root_column("v").flatten(&json!("text"));
    assert_eq!(record.get("v"), Some(&json!("text")));
}

#[test]
fn test_flatten_top_level_array_record() {
    let record = Flattener::default().flatten(&json!([10, {"a": 1}]));
    assert_eq!(names(&record), vec!["0", "1.a"]);
}

#[test]
fn test_flatten_custom_separator() {
    let record = Flattener::default()
        .with_separator("__")
        .flatten(&json!({"a": {"b": [1]}}));
    assert_eq!(names(&record), vec!["a__b__0"]);
}

#[test]
fn test_flatten_duplicate_path_last_wins() {
    let record = Flattener::default().flatten(&json!({"a.b": 1, "a": {"b": 2}}));
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("a.b"), Some(&json!(2)));
}

// ============================================================================
// Opaque Policy Tests
// ============================================================================

#[test]
fn test_flatten_opaque_arrays() {
    let flattener = Flattener::new(ArrayPolicy::Opaque);
    let record = flattener.flatten(&json!({"id": 1, "tags": ["a", "b"], "meta": {"n": [1, 2]}}));

    assert_eq!(names(&record), vec!["id", "tags", "meta.n"]);
    assert_eq!(record.get("tags"), Some(&json!(r#"["a","b"]"#)));
    assert_eq!(record.get("meta.n"), Some(&json!("[1,2]")));
}

#[test]
fn test_flatten_opaque_empty_array() {
    let record = Flattener::new(ArrayPolicy::Opaque).flatten(&json!({"tags": []}));
    assert_eq!(record.get("tags"), Some(&json!("[]")));
}

#[test]
fn test_flatten_opaque_top_level_array() {
    let record = Flattener::new(ArrayPolicy::Opaque).flatten(&json!([1, 2]));
    assert_eq!(record.get("value"), Some(&json!("[1,2]")));
}

#[test]
fn test_flatten_opaque_column_count_is_stable() {
    let flattener = Flattener::new(ArrayPolicy::Opaque);
    let short = flattener.flatten(&json!({"xs": [1]}));
    let long = flattener.flatten(&json!({"xs": [1, 2, 3, 4, 5]}));
    assert_eq!(names(&short), names(&long));
}

// ============================================================================
// Max Depth Tests
// ============================================================================

#[test]
fn test_flatten_max_depth_cutoff() {
    let flattener = Flattener::default().with_max_depth(2);
    let record = flattener.flatten(&json!({"a": {"b": {"c": 1}}, "x": [[1, 2]], "y": 3}));

    assert_eq!(names(&record), vec!["a.b", "x.0", "y"]);
    assert_eq!(record.get("a.b"), Some(&json!(r#"{"c":1}"#)));
    assert_eq!(record.get("x.0"), Some(&json!("[1,2]")));
}

#[test]
fn test_flatten_deep_nesting_is_total() {
    let mut value = json!(1);
    for _ in 0..500 {
        value = json!({ "n": value });
    }
    let record = Flattener::default().flatten(&value);
    assert_eq!(record.len(), 1);
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test_case(json!({"a": 1, "b": {"c": 2}}) ; "nested object")]
#[test_case(json!({"a": [1, 2, 3]}) ; "array of scalars")]
#[test_case(json!({"a": [{"x": 1}, {"x": 2, "y": [true, null]}]}) ; "array of objects")]
#[test_case(json!({"s": "text", "f": 1.5, "n": null, "b": false}) ; "scalar leaves")]
#[test_case(json!([1, {"k": "v"}]) ; "top level array")]
#[test_case(json!("scalar") ; "top level scalar")]
#[test_case(json!({"deep": {"er": {"est": {"x": [[1, 2], [3]]}}}}) ; "deep nesting")]
fn test_explode_round_trip(original: Value) {
    let flattener = Flattener::new(ArrayPolicy::Explode);
    let record = flattener.flatten(&original);
    assert_eq!(flattener.unflatten(&record), original);
}

#[test]
fn test_unflatten_from_columns() {
    let record: FlatRecord = vec![
        ("a", json!(1)),
        ("b.c", json!(2)),
        ("b.d.0", json!("x")),
        ("b.d.1", json!("y")),
    ]
    .into_iter()
    .collect();

    let value = Flattener::default().unflatten(&record);
    assert_eq!(value, json!({"a": 1, "b": {"c": 2, "d": ["x", "y"]}}));
}

#[test]
fn test_flat_record_into_object_keeps_order() {
    let record = Flattener::default().flatten(&json!({"z": 1, "a": {"m": 2}}));
    let object = record.into_object();
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a.m"]);
}
