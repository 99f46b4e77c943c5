// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Solidafy Stream
//!
//! Streaming conversion of large JSON documents into Parquet with bounded
//! memory.
//!
//! ## Features
//!
//! - **Three input shapes**: a top-level array, NDJSON lines, or an array
//!   nested under a key path, read one record at a time
//! - **Flattening**: nested objects become dotted column names; arrays are
//!   exploded into indexed columns or kept as JSON text
//! - **Per-batch schemas**: column order by first appearance, types widened
//!   along `null < bool | integer < float < string`
//! - **Two output modes**: one appended file with a frozen schema, or one
//!   file per batch
//! - **Structured reports**: skipped lines and rejected batches are counted
//!   and listed, never dropped silently
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use solidafy_stream::{convert, ConvertOptions, OutputTarget, PathSelector, Result};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! fn main() -> Result<()> {
//!     let reader = BufReader::new(File::open("events.ndjson")?);
//!     let options = ConvertOptions::new()
//!         .with_path_selector(PathSelector::NdjsonLines)
//!         .with_batch_size(50_000)
//!         .with_skip_on_error(true);
//!
//!     let report = convert(reader, &OutputTarget::Append("events.parquet".into()), &options)?;
//!     println!("{} rows, {} skipped", report.records_written, report.records_skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  input ─► decode ─► flatten ─► batch ─► schema ─► output
//!          RawRecord  FlatRecord  Batch   ColumnSchema  Parquet
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Conversion options
pub mod config;

/// Incremental record decoders
pub mod decode;

/// Nested to flat records
pub mod flatten;

/// Per-batch schema inference
pub mod schema;

/// Volumetric batching
pub mod batch;

/// Arrow/Parquet output
pub mod output;

/// Conversion pipeline
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use config::ConvertOptions;
pub use engine::{
    convert, sample_schema, CancellationToken, ConversionReport, Converter, ProgressEvent,
    ProgressObserver,
};
pub use output::OutputTarget;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
