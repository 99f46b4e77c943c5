//! Volumetric batcher

use super::types::Batch;
use crate::error::{Error, Result};
use crate::flatten::FlatRecord;

/// Groups records into batches of at most `threshold` records
///
/// Boundaries depend only on how many records arrived, never on their
/// content.
#[derive(Debug)]
pub struct Batcher {
    /// Maximum records per batch
    threshold: usize,
    /// Records waiting for the next flush
    buffer: Vec<FlatRecord>,
    /// Number given to the next non-empty batch
    next_index: usize,
}

impl Batcher {
    /// Create a batcher
    pub fn new(threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::invalid_value("batch_size", "must be at least 1"));
        }
        Ok(Self {
            threshold,
            buffer: Vec::with_capacity(threshold.min(64 * 1024)),
            next_index: 1,
        })
    }

    /// Maximum records per batch
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Records currently buffered
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer a record, returning a full batch once the threshold is reached
    pub fn accept(&mut self, record: FlatRecord) -> Option<Batch> {
        self.buffer.push(record);
        if self.buffer.len() >= self.threshold {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Take whatever is buffered as a batch (possibly empty)
    pub fn drain(&mut self) -> Batch {
        let records = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.threshold.min(64 * 1024)),
        );
        let index = self.next_index;
        if !records.is_empty() {
            self.next_index += 1;
        }
        Batch::new(index, records)
    }

    /// Final flush at end of input
    ///
    /// Consumes the batcher, so the trailing batch is produced exactly once.
    pub fn finish(mut self) -> Batch {
        self.drain()
    }
}
