//! Incremental record decoder module
//!
//! Supports: top-level JSON arrays, NDJSON, arrays under a dotted key path
//!
//! # Overview
//!
//! The decode module turns a byte stream into a lazy sequence of JSON
//! records. Only the record currently being produced is buffered; values
//! outside the selected path are skipped structurally.

mod decoders;
mod scanner;
mod types;

pub use decoders::{ArrayDecoder, NdjsonDecoder, RecordStream};
pub use scanner::ByteScanner;
pub use types::{Position, RawRecord};
