//! Output module
//!
//! Turns batches of flat records into Arrow RecordBatches and writes them as
//! Parquet.
//!
//! # Targets
//!
//! - [`OutputTarget::Append`]: one file. The schema is frozen at the first
//!   batch and later batches are reconciled with it per [`DriftPolicy`].
//!   The file only appears under its final name once the run succeeds.
//! - [`OutputTarget::MultiFile`]: one self-contained file per batch.
//!
//! [`DriftPolicy`]: crate::types::DriftPolicy

mod encoder;
mod target;
mod writer;

pub use encoder::{encode_batch, encode_records};
pub use target::{
    in_progress_path, AppendSink, BatchOutcome, MultiFileSink, OutputSink, OutputTarget,
};
pub use writer::{write_batch_to_parquet, ParquetWriter, ParquetWriterConfig};
