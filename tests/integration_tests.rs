//! Integration tests for the public conversion API
//!
//! Tests the full end-to-end flow: JSON input file → records → batches →
//! Parquet files read back through the Arrow reader.

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solidafy_stream::flatten::Flattener;
use solidafy_stream::{
    convert, sample_schema, ArrayPolicy, Compression, ConvertOptions, Converter, DriftPolicy,
    ErrorKind, OutputMode, OutputTarget, PathSelector,
};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;
use tempfile::tempdir;

fn read_parquet(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).unwrap();
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

fn row_count(path: &Path) -> usize {
    read_parquet(path).iter().map(RecordBatch::num_rows).sum()
}

fn field_names(path: &Path) -> Vec<String> {
    let batches = read_parquet(path);
    batches[0]
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

fn open(path: &Path) -> BufReader<File> {
    BufReader::new(File::open(path).unwrap())
}

// ============================================================================
// Input Shapes
// ============================================================================

#[test]
fn test_ndjson_multi_file_25k() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("events.ndjson");
    {
        let mut file = File::create(&input).unwrap();
        for i in 0..25_000 {
            writeln!(file, r#"{{"id": {i}, "user": {{"name": "u{i}"}}, "score": {}}}"#, i % 7)
                .unwrap();
        }
    }

    let options = ConvertOptions::new()
        .with_path_selector(PathSelector::NdjsonLines)
        .with_batch_size(10_000)
        .with_mode(OutputMode::MultiFile);
    let target = OutputTarget::new(options.mode, dir.path().join("events"));
    let report = convert(open(&input), &target, &options).unwrap();

    assert_eq!(report.records_read, 25_000);
    assert_eq!(report.batches, 3);
    let rows: Vec<usize> = report.files.iter().map(|f| row_count(f)).collect();
    assert_eq!(rows, vec![10_000, 10_000, 5_000]);
    assert_eq!(
        field_names(&dir.path().join("events_batch_3.parquet")),
        vec!["id", "user.name", "score"]
    );
}

#[test]
fn test_top_level_array_append() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("users.json");
    let output = dir.path().join("users.parquet");
    let records: Vec<Value> = (0..250)
        .map(|i| json!({"id": i, "name": format!("user {i}"), "address": {"zip": 1000 + i}}))
        .collect();
    fs::write(&input, serde_json::to_vec_pretty(&records).unwrap()).unwrap();

    let options = ConvertOptions::new().with_batch_size(100);
    let report = convert(open(&input), &OutputTarget::Append(output.clone()), &options).unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.records_written, 250);
    assert_eq!(report.files, vec![output.clone()]);
    assert_eq!(row_count(&output), 250);
    assert_eq!(field_names(&output), vec!["id", "name", "address.zip"]);

    let ids: Vec<i64> = read_parquet(&output)
        .iter()
        .flat_map(|b| {
            b.column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap()
                .values()
                .to_vec()
        })
        .collect();
    assert_eq!(ids, (0..250).collect::<Vec<i64>>());
}

#[test]
fn test_key_path_skips_siblings() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("response.json");
    let output = dir.path().join("items.parquet");
    fs::write(
        &input,
        r#"{
            "paging": {"next": null, "items": ["not", "these"]},
            "result": {
                "count": 3,
                "items": [
                    {"sku": "a-1", "price": 9.5},
                    {"sku": "b-2", "price": 12},
                    {"sku": "c-3", "price": null}
                ]
            },
            "trailer": [1, 2, 3]
        }"#,
    )
    .unwrap();

    let options = ConvertOptions::new()
        .with_path_selector(PathSelector::key_path("result.items"))
        .with_compression(Compression::Zstd);
    let report = convert(open(&input), &OutputTarget::Append(output.clone()), &options).unwrap();
    assert_eq!(report.records_written, 3);

    let batches = read_parquet(&output);
    let price = batches[0].column(1);
    assert_eq!(price.data_type(), &DataType::Float64);
    let price = price.as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(price.value(0), 9.5);
    assert_eq!(price.value(1), 12.0);
    assert!(price.is_null(2));

    let metadata = SerializedFileReader::new(File::open(&output).unwrap())
        .unwrap()
        .metadata()
        .row_group(0)
        .column(0)
        .compression();
    assert_eq!(
        metadata,
        parquet::basic::Compression::ZSTD(parquet::basic::ZstdLevel::default())
    );
}

#[test]
fn test_missing_key_path_yields_no_records() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.parquet");
    let options =
        ConvertOptions::new().with_path_selector(PathSelector::key_path("data.items"));

    let report = convert(
        &br#"{"meta": {"items": [1]}}"#[..],
        &OutputTarget::Append(output.clone()),
        &options,
    )
    .unwrap();

    assert_eq!(report.records_read, 0);
    assert!(report.files.is_empty());
    assert!(!output.exists());
}

#[test]
fn test_key_path_malformed_document_leaves_no_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.parquet");
    let options = ConvertOptions::new().with_path_selector(PathSelector::key_path("data"));

    for input in [
        r#"{"data": [{"a": 1}], "tail": "#,
        r#"{"skip": [1,,,2 garbage], "x": tru, "data": [{"a": 1}]}"#,
        r#"{"data": [{"a": 1}, {"a": 2}]"#,
    ] {
        let err = convert(input.as_bytes(), &OutputTarget::Append(output.clone()), &options)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "input {input:?}");
        assert!(!output.exists(), "input {input:?}");
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}

// ============================================================================
// Array Policies
// ============================================================================

#[test]
fn test_explode_and_opaque_columns() {
    let dir = tempdir().unwrap();
    let input = br#"[{"id": 1, "tags": ["x", "y"], "geo": {"pt": [1.5, 2.5]}}]"#;

    let exploded = dir.path().join("exploded.parquet");
    convert(
        &input[..],
        &OutputTarget::Append(exploded.clone()),
        &ConvertOptions::new().with_array_policy(ArrayPolicy::Explode),
    )
    .unwrap();
    assert_eq!(
        field_names(&exploded),
        vec!["id", "tags.0", "tags.1", "geo.pt.0", "geo.pt.1"]
    );

    let opaque = dir.path().join("opaque.parquet");
    convert(
        &input[..],
        &OutputTarget::Append(opaque.clone()),
        &ConvertOptions::new().with_array_policy(ArrayPolicy::Opaque),
    )
    .unwrap();
    assert_eq!(field_names(&opaque), vec!["id", "tags", "geo.pt"]);

    let batches = read_parquet(&opaque);
    let tags = batches[0]
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    let parsed: Value = serde_json::from_str(tags.value(0)).unwrap();
    assert_eq!(parsed, json!(["x", "y"]));
}

#[test]
fn test_explode_round_trip() {
    let flattener = Flattener::default();
    let values = [
        json!({"a": 1, "b": {"c": [true, null, {"d": "e"}]}}),
        json!({"user": {"name": "x", "roles": ["admin", "dev"]}, "n": 2.5}),
        json!({"deep": {"er": {"est": {"value": "v"}}}}),
    ];
    for value in values {
        assert_eq!(flattener.unflatten(&flattener.flatten(&value)), value);
    }
}

// ============================================================================
// Error Handling and Drift
// ============================================================================

#[test]
fn test_ndjson_skip_errors_reported() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.parquet");
    let input = "{\"a\": 1}\n{\"a\": 2}\n{oops}\n{\"a\": 3}\n\n{\"a\": 4}\n";

    let options = ConvertOptions::new()
        .with_path_selector(PathSelector::NdjsonLines)
        .with_skip_on_error(true);
    let report = convert(input.as_bytes(), &OutputTarget::Append(output.clone()), &options)
        .unwrap();

    assert_eq!(report.records_written, 4);
    assert_eq!(report.records_skipped, 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].line, Some(3));
    assert_eq!(row_count(&output), 4);
}

#[test]
fn test_truncated_array_leaves_no_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.parquet");
    let input = r#"[{"a": 1}, {"a": 2}, {"a": 3"#;

    let options = ConvertOptions::new().with_batch_size(1);
    let err = convert(input.as_bytes(), &OutputTarget::Append(output.clone()), &options)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

#[test]
fn test_append_drift_policies() {
    let dir = tempdir().unwrap();
    let input = "{\"id\": 1, \"v\": 10}\n{\"id\": 2, \"v\": 20}\n{\"id\": 3, \"v\": \"thirty\"}\n";

    let base = ConvertOptions::new()
        .with_path_selector(PathSelector::NdjsonLines)
        .with_batch_size(2);

    let fail = dir.path().join("fail.parquet");
    let err = convert(
        input.as_bytes(),
        &OutputTarget::Append(fail.clone()),
        &base.clone().with_drift_policy(DriftPolicy::Fail),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaConflict);
    assert!(!fail.exists());

    let reject = dir.path().join("reject.parquet");
    let report = convert(
        input.as_bytes(),
        &OutputTarget::Append(reject.clone()),
        &base.clone().with_drift_policy(DriftPolicy::Reject),
    )
    .unwrap();
    assert_eq!(report.records_rejected, 1);
    assert_eq!(row_count(&reject), 2);

    let pad = dir.path().join("pad.parquet");
    let report = convert(
        input.as_bytes(),
        &OutputTarget::Append(pad.clone()),
        &base.with_drift_policy(DriftPolicy::NullPad),
    )
    .unwrap();
    assert_eq!(report.records_written, 3);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(row_count(&pad), 3);
}

#[test]
fn test_multi_file_schemas_are_independent() {
    let dir = tempdir().unwrap();
    let input = "{\"v\": 1}\n{\"v\": \"one\"}\n";

    let options = ConvertOptions::new()
        .with_path_selector(PathSelector::NdjsonLines)
        .with_batch_size(1)
        .with_drift_policy(DriftPolicy::Fail);
    let report = convert(
        input.as_bytes(),
        &OutputTarget::MultiFile(dir.path().join("v.parquet")),
        &options,
    )
    .unwrap();

    assert!(report.is_clean());
    let first = read_parquet(&report.files[0]);
    let second = read_parquet(&report.files[1]);
    assert_eq!(first[0].schema().field(0).data_type(), &DataType::Int64);
    assert_eq!(second[0].schema().field(0).data_type(), &DataType::Utf8);
}

// ============================================================================
// Options and Schema Preview
// ============================================================================

#[test]
fn test_options_file_drives_conversion() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("options.yaml");
    fs::write(
        &config,
        "path_selector: ndjson\nbatch_size: 2\nseparator: \"__\"\ncompression: gzip\n",
    )
    .unwrap();
    let options = ConvertOptions::from_file(&config).unwrap();

    let output = dir.path().join("out.parquet");
    let report = Converter::new(options)
        .run(
            "{\"a\": {\"b\": 1}}\n{\"a\": {\"b\": 2}}\n{\"a\": {\"b\": 3}}\n".as_bytes(),
            &OutputTarget::Append(output.clone()),
        )
        .unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(field_names(&output), vec!["a__b"]);
}

#[test]
fn test_sample_schema_preview() {
    let input = br#"[{"a": 1, "b": {"c": "x"}}, {"a": 2.5, "d": null}]"#;
    let schema = sample_schema(&input[..], &ConvertOptions::new(), 1000).unwrap();

    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        json,
        json!({"columns": [
            {"name": "a", "type": "float"},
            {"name": "b.c", "type": "string"},
            {"name": "d", "type": "null"}
        ]})
    );
}
