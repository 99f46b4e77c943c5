//! Batch schema unification

use super::types::{ColumnDef, ColumnSchema, ColumnType};
use crate::flatten::FlatRecord;
use std::collections::HashMap;

/// Accumulates the column union and types of a batch
///
/// Columns keep the position where they were first seen; types are joined
/// over every non-null value.
#[derive(Debug, Clone, Default)]
pub struct SchemaUnifier {
    /// Columns in first-seen order
    columns: Vec<ColumnDef>,
    /// Column name to position in `columns`
    index: HashMap<String, usize>,
    /// Records observed
    record_count: usize,
}

impl SchemaUnifier {
    /// Create an empty unifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the running schema
    pub fn observe(&mut self, record: &FlatRecord) {
        self.record_count += 1;
        for (name, value) in record.iter() {
            let found = ColumnType::of(value);
            match self.index.get(name) {
                Some(&pos) => {
                    let column = &mut self.columns[pos];
                    column.column_type = column.column_type.merge_with(found);
                }
                None => {
                    self.index.insert(name.to_string(), self.columns.len());
                    self.columns.push(ColumnDef::new(name, found));
                }
            }
        }
    }

    /// Records observed so far
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Snapshot of the schema so far
    pub fn schema(&self) -> ColumnSchema {
        ColumnSchema::new(self.columns.clone())
    }

    /// Finish and return the schema
    pub fn finish(self) -> ColumnSchema {
        ColumnSchema::new(self.columns)
    }
}

/// Unify the schema of a slice of records
pub fn unify(records: &[FlatRecord]) -> ColumnSchema {
    let mut unifier = SchemaUnifier::new();
    for record in records {
        unifier.observe(record);
    }
    unifier.finish()
}
