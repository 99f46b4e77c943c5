//! Schema unification tests

use super::*;
use crate::flatten::{FlatRecord, Flattener};
use arrow::datatypes::DataType;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn flat(values: &[Value]) -> Vec<FlatRecord> {
    let flattener = Flattener::default();
    values.iter().map(|v| flattener.flatten(v)).collect()
}

// ============================================================================
// Column Type Tests
// ============================================================================

#[test_case(json!(null), ColumnType::Null ; "null")]
#[test_case(json!(true), ColumnType::Boolean ; "boolean")]
#[test_case(json!(7), ColumnType::Integer ; "integer")]
#[test_case(json!(-7), ColumnType::Integer ; "negative integer")]
#[test_case(json!(1.5), ColumnType::Float ; "float")]
#[test_case(json!(u64::MAX), ColumnType::Float ; "u64 past i64 range")]
#[test_case(json!("s"), ColumnType::String ; "string")]
#[test_case(json!([1]), ColumnType::String ; "container")]
fn test_column_type_of(value: Value, expected: ColumnType) {
    assert_eq!(ColumnType::of(&value), expected);
}

#[test_case(ColumnType::Integer, ColumnType::Integer, ColumnType::Integer ; "int int")]
#[test_case(ColumnType::Integer, ColumnType::Float, ColumnType::Float ; "int float")]
#[test_case(ColumnType::Integer, ColumnType::String, ColumnType::String ; "int string")]
#[test_case(ColumnType::Float, ColumnType::String, ColumnType::String ; "float string")]
#[test_case(ColumnType::Null, ColumnType::Float, ColumnType::Float ; "null float")]
#[test_case(ColumnType::Boolean, ColumnType::Null, ColumnType::Boolean ; "bool null")]
#[test_case(ColumnType::Boolean, ColumnType::Integer, ColumnType::String ; "bool int")]
#[test_case(ColumnType::Null, ColumnType::Null, ColumnType::Null ; "null null")]
fn test_merge_is_commutative(a: ColumnType, b: ColumnType, expected: ColumnType) {
    assert_eq!(a.merge_with(b), expected);
    assert_eq!(b.merge_with(a), expected);
}

#[test]
fn test_merge_is_associative() {
    let all = [
        ColumnType::Null,
        ColumnType::Boolean,
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::String,
    ];
    for a in all {
        for b in all {
            for c in all {
                assert_eq!(
                    a.merge_with(b).merge_with(c),
                    a.merge_with(b.merge_with(c)),
                    "({a} ⊔ {b}) ⊔ {c}"
                );
            }
        }
    }
}

#[test]
fn test_column_type_to_arrow() {
    assert_eq!(ColumnType::Null.to_arrow(), DataType::Null);
    assert_eq!(ColumnType::Boolean.to_arrow(), DataType::Boolean);
    assert_eq!(ColumnType::Integer.to_arrow(), DataType::Int64);
    assert_eq!(ColumnType::Float.to_arrow(), DataType::Float64);
    assert_eq!(ColumnType::String.to_arrow(), DataType::Utf8);
}

// ============================================================================
// Unifier Tests
// ============================================================================

#[test]
fn test_unify_first_seen_order() {
    let records = flat(&[
        json!({"b": 1, "a": 2}),
        json!({"c": 3, "a": 4}),
        json!({"d": {"e": 5}, "b": 6}),
    ]);
    let schema = unify(&records);
    assert_eq!(schema.names(), vec!["b", "a", "c", "d.e"]);
}

#[test]
fn test_unify_is_deterministic() {
    let records = flat(&[
        json!({"x": 1, "nested": {"k": [1, 2]}}),
        json!({"y": "s", "nested": {"j": null}}),
    ]);
    let first = unify(&records);
    for _ in 0..10 {
        assert_eq!(unify(&records), first);
    }
}

#[test]
fn test_unify_integers() {
    let schema = unify(&flat(&[json!({"n": 1}), json!({"n": 2}), json!({"n": null})]));
    assert_eq!(schema.column_type("n"), Some(ColumnType::Integer));
}

#[test]
fn test_unify_int_and_float() {
    let schema = unify(&flat(&[json!({"n": 1}), json!({"n": 2.5})]));
    assert_eq!(schema.column_type("n"), Some(ColumnType::Float));
}

#[test]
fn test_unify_numeric_and_string() {
    let schema = unify(&flat(&[json!({"n": 1}), json!({"n": "one"})]));
    assert_eq!(schema.column_type("n"), Some(ColumnType::String));
}

#[test]
fn test_unify_all_nulls() {
    let schema = unify(&flat(&[json!({"n": null}), json!({"n": null})]));
    assert_eq!(schema.column_type("n"), Some(ColumnType::Null));
}

#[test]
fn test_unify_order_does_not_change_types() {
    let values = [
        json!({"a": 1, "b": true, "c": null}),
        json!({"a": 2.5, "b": null, "c": "x"}),
        json!({"a": null, "b": false, "c": 3}),
    ];
    let forward = unify(&flat(&values));

    let mut reversed_values = values.to_vec();
    reversed_values.reverse();
    let reversed = unify(&flat(&reversed_values));

    for column in &forward.columns {
        assert_eq!(
            reversed.column_type(&column.name),
            Some(column.column_type),
            "column {}",
            column.name
        );
    }
    assert_eq!(forward.column_type("a"), Some(ColumnType::Float));
    assert_eq!(forward.column_type("b"), Some(ColumnType::Boolean));
    assert_eq!(forward.column_type("c"), Some(ColumnType::String));
}

#[test]
fn test_unifier_counts_records() {
    let mut unifier = SchemaUnifier::new();
    for record in flat(&[json!({}), json!({"a": 1})]) {
        unifier.observe(&record);
    }
    assert_eq!(unifier.record_count(), 2);
    assert_eq!(unifier.schema().names(), vec!["a"]);
}

#[test]
fn test_to_arrow_schema() {
    let schema = unify(&flat(&[json!({"a": 1, "b": {"c": "x"}})]));
    let arrow = schema.to_arrow();
    assert_eq!(arrow.fields().len(), 2);
    assert_eq!(arrow.field(0).name(), "a");
    assert_eq!(arrow.field(1).name(), "b.c");
    assert!(arrow.field(1).is_nullable());
    assert_eq!(arrow.field(1).data_type(), &DataType::Utf8);
}

// ============================================================================
// Drift Tests
// ============================================================================

#[test]
fn test_drift_none_for_subset() {
    let frozen = unify(&flat(&[json!({"a": 1, "b": "x"})]));
    let batch = unify(&flat(&[json!({"a": 2})]));
    assert!(batch.drift_from(&frozen).is_empty());
}

#[test]
fn test_drift_integer_into_float_is_compatible() {
    let frozen = unify(&flat(&[json!({"a": 1.5})]));
    let batch = unify(&flat(&[json!({"a": 2}), json!({"a": null})]));
    assert!(batch.drift_from(&frozen).is_empty());
}

#[test]
fn test_drift_new_column_and_type_change() {
    let frozen = unify(&flat(&[json!({"a": 1})]));
    let batch = unify(&flat(&[json!({"a": "text", "z": true})]));

    let drift = batch.drift_from(&frozen);
    assert_eq!(
        drift,
        vec![
            SchemaDrift::TypeChanged {
                name: "a".to_string(),
                expected: ColumnType::Integer,
                found: ColumnType::String,
            },
            SchemaDrift::NewColumn {
                name: "z".to_string(),
                found: ColumnType::Boolean,
            },
        ]
    );
    assert_eq!(drift[0].column(), "a");
    assert_eq!(drift[0].to_string(), "column 'a' is integer in file, string in batch");
}

#[test]
fn test_schema_serializes() {
    let schema = ColumnSchema::new(vec![ColumnDef::new("a.b", ColumnType::Float)]);
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(json, json!({"columns": [{"name": "a.b", "type": "float"}]}));
}
