//! Flat records to Arrow RecordBatch
//!
//! Every value is coerced to its column's type. Integers widen into float
//! columns and anything non-null stringifies into a string column. A value
//! the column type cannot hold becomes null, which only happens when a batch
//! is written against a frozen schema it drifted from.

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::flatten::FlatRecord;
use crate::schema::{ColumnSchema, ColumnType};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use std::sync::Arc;

/// Encode a batch against a column schema
pub fn encode_batch(batch: &Batch, schema: &ColumnSchema) -> Result<RecordBatch> {
    encode_records(batch.records(), schema).map_err(|e| match e {
        Error::Encode { message } => Error::encode(format!("batch {}: {message}", batch.index())),
        other => other,
    })
}

/// Encode flat records against a column schema
///
/// Columns of `schema` a record lacks are null for that row. Record columns
/// not in `schema` are ignored.
pub fn encode_records(records: &[FlatRecord], schema: &ColumnSchema) -> Result<RecordBatch> {
    if schema.is_empty() && !records.is_empty() {
        return Err(Error::encode(format!(
            "{} record(s) produced no columns",
            records.len()
        )));
    }

    let arrow_schema = Arc::new(schema.to_arrow());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.len());

    for column in &schema.columns {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.get(&column.name))
            .collect();
        columns.push(build_array(&values, column.column_type));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
    RecordBatch::try_new_with_options(arrow_schema, columns, &options)
        .map_err(|e| Error::encode(format!("failed to create RecordBatch: {e}")))
}

/// Build an Arrow array from leaf values
fn build_array(values: &[Option<&Value>], column_type: ColumnType) -> ArrayRef {
    match column_type {
        ColumnType::Null => Arc::new(NullArray::new(values.len())),

        ColumnType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Arc::new(arr)
        }

        ColumnType::Integer => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Arc::new(arr)
        }

        ColumnType::Float => {
            // as_f64 covers i64 and u64 too
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Arc::new(arr)
        }

        ColumnType::String => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.and_then(|v| match v {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        _ => Some(v.to_string()),
                    })
                })
                .collect();
            Arc::new(arr)
        }
    }
}
