//! CLI module
//!
//! Command-line interface for converting JSON inputs.
//!
//! # Commands
//!
//! - `convert` - Convert an input into one Parquet file or a set of batch files
//! - `schema` - Print the schema inferred from a sample of records

mod commands;
mod runner;

pub use commands::{Cli, Commands, InputArgs};
pub use runner::Runner;
