//! Batch types

use crate::flatten::FlatRecord;

/// An ordered group of flat records flushed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// 1-based batch number
    index: usize,
    /// Records in arrival order
    records: Vec<FlatRecord>,
}

impl Batch {
    /// Create a batch
    pub fn new(index: usize, records: Vec<FlatRecord>) -> Self {
        Self { index, records }
    }

    /// 1-based batch number
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arrival order
    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    /// Take the records out of the batch
    pub fn into_records(self) -> Vec<FlatRecord> {
        self.records
    }
}
