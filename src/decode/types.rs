//! Decoder types
//!
//! Defines the record produced by the incremental decoders.

use serde_json::Value;

/// One JSON value extracted at the configured path
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// The fully materialized value
    pub value: Value,
    /// 1-based position of the record in the stream
    pub ordinal: u64,
    /// 1-based line where the record starts
    pub line: u64,
    /// Byte offset where the record starts
    pub offset: u64,
}

impl RawRecord {
    /// Create a record at a stream position
    pub fn new(value: Value, ordinal: u64, line: u64, offset: u64) -> Self {
        Self {
            value,
            ordinal,
            line,
            offset,
        }
    }

    /// Take the value out of the record
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Position inside the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number
    pub line: u64,
    /// Byte offset from the start of the stream
    pub offset: u64,
}

impl Position {
    /// Start of a stream
    pub fn start() -> Self {
        Self { line: 1, offset: 0 }
    }
}
