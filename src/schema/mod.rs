//! Schema module
//!
//! Derives a tabular schema from flattened records.
//!
//! # Features
//!
//! - **First-seen ordering**: column order is stable for identical input
//! - **Type widening**: `null < integer < float < string`, booleans join only with themselves
//! - **Drift detection**: compares a batch schema against a frozen file schema
//! - **Arrow mapping**: every column becomes a nullable Arrow field

mod inference;
mod types;

pub use inference::{unify, SchemaUnifier};
pub use types::{ColumnDef, ColumnSchema, ColumnType, SchemaDrift};

#[cfg(test)]
mod tests;
