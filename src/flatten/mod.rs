//! Flattening module
//!
//! Converts nested JSON records into flat column/value mappings.
//!
//! # Array policies
//!
//! - **Explode** (default): `{"tags": ["a", "b"]}` becomes `tags.0`, `tags.1`.
//!   Variable-length arrays produce a variable number of columns, so a batch
//!   can grow very wide on untrusted input.
//! - **Opaque**: the array is kept as one JSON-encoded string column. Use this
//!   when array lengths vary from record to record.

mod flattener;
mod types;

pub use flattener::Flattener;
pub use types::FlatRecord;

#[cfg(test)]
mod tests;
