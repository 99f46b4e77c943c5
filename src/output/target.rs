//! Output targets and the sinks that write batches into them

use super::encoder::encode_batch;
use super::writer::{write_batch_to_parquet, ParquetWriter, ParquetWriterConfig};
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::schema::{ColumnSchema, SchemaDrift};
use crate::types::{DriftPolicy, OutputMode};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of files that are still being written
const IN_PROGRESS_SUFFIX: &str = ".inprogress";

/// Where converted batches go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Every batch into one file
    Append(PathBuf),
    /// One `<prefix>_batch_<n>.parquet` file per batch
    MultiFile(PathBuf),
}

impl OutputTarget {
    /// Build a target for an output mode
    pub fn new(mode: OutputMode, path: impl Into<PathBuf>) -> Self {
        match mode {
            OutputMode::Append => Self::Append(path.into()),
            OutputMode::MultiFile => Self::MultiFile(path.into()),
        }
    }

    /// Output mode of this target
    pub fn mode(&self) -> OutputMode {
        match self {
            Self::Append(_) => OutputMode::Append,
            Self::MultiFile(_) => OutputMode::MultiFile,
        }
    }

    /// File path or prefix as given
    pub fn path(&self) -> &Path {
        match self {
            Self::Append(path) | Self::MultiFile(path) => path,
        }
    }

    /// Path of the `n`th (1-based) file of a multi-file target
    ///
    /// A trailing `.parquet` on the prefix is dropped first, so `out.parquet`
    /// and `out` both give `out_batch_1.parquet`.
    pub fn batch_path(prefix: &Path, n: usize) -> PathBuf {
        let prefix = match prefix.to_str() {
            Some(s) => PathBuf::from(s.strip_suffix(".parquet").unwrap_or(s)),
            None => prefix.to_path_buf(),
        };
        let mut name: OsString = prefix.into_os_string();
        name.push(format!("_batch_{n}.parquet"));
        PathBuf::from(name)
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append(path) => write!(f, "append:{}", path.display()),
            Self::MultiFile(prefix) => write!(f, "multi-file:{}", prefix.display()),
        }
    }
}

/// Temporary name a file is written under before it is finalized
pub fn in_progress_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(IN_PROGRESS_SUFFIX);
    PathBuf::from(name)
}

/// Result of handing one batch to a sink
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Rows reached the file
    Written {
        rows: usize,
        /// File that holds the batch, once it is final (multi-file only)
        file: Option<PathBuf>,
        /// Drift that was null-padded away
        padded: Vec<SchemaDrift>,
    },
    /// The batch was dropped because its schema drifted
    Rejected { rows: usize, drift: Vec<SchemaDrift> },
}

/// Writes batches into an output target
#[derive(Debug)]
pub enum OutputSink {
    Append(AppendSink),
    MultiFile(MultiFileSink),
}

impl OutputSink {
    /// Open a sink for a target; nothing touches disk until the first batch
    pub fn open(target: &OutputTarget, config: ParquetWriterConfig, policy: DriftPolicy) -> Self {
        match target {
            OutputTarget::Append(path) => Self::Append(AppendSink::new(path, config, policy)),
            OutputTarget::MultiFile(prefix) => Self::MultiFile(MultiFileSink::new(prefix, config)),
        }
    }

    /// Schema fixed for the rest of the output, if any
    pub fn frozen_schema(&self) -> Option<&ColumnSchema> {
        match self {
            Self::Append(sink) => sink.frozen_schema(),
            Self::MultiFile(_) => None,
        }
    }

    /// Write one batch using its own inferred schema
    pub fn write_batch(&mut self, batch: &Batch, schema: &ColumnSchema) -> Result<BatchOutcome> {
        match self {
            Self::Append(sink) => sink.write_batch(batch, schema),
            Self::MultiFile(sink) => sink.write_batch(batch, schema),
        }
    }

    /// Finalize output, returning every file produced
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        match self {
            Self::Append(sink) => sink.finish(),
            Self::MultiFile(sink) => Ok(sink.finish()),
        }
    }

    /// Give up on the output; the in-progress append file is removed
    pub fn abort(self) {
        match self {
            Self::Append(sink) => sink.abort(),
            Self::MultiFile(sink) => sink.abort(),
        }
    }
}

// ============================================================================
// Append
// ============================================================================

/// Single-file sink with the schema frozen at the first batch
///
/// The file lives at `<path>.inprogress` until [`AppendSink::finish`]
/// renames it. Dropping the sink unfinished deletes it.
#[derive(Debug)]
pub struct AppendSink {
    path: PathBuf,
    temp_path: PathBuf,
    config: ParquetWriterConfig,
    policy: DriftPolicy,
    writer: Option<ParquetWriter>,
    frozen: Option<ColumnSchema>,
}

impl AppendSink {
    /// Create a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>, config: ParquetWriterConfig, policy: DriftPolicy) -> Self {
        let path = path.into();
        Self {
            temp_path: in_progress_path(&path),
            path,
            config,
            policy,
            writer: None,
            frozen: None,
        }
    }

    /// On-disk schema, once the first batch fixed it
    pub fn frozen_schema(&self) -> Option<&ColumnSchema> {
        self.frozen.as_ref()
    }

    /// Write a batch, reconciling `schema` with the frozen one
    pub fn write_batch(&mut self, batch: &Batch, schema: &ColumnSchema) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::Written {
                rows: 0,
                file: None,
                padded: Vec::new(),
            });
        }

        if self.writer.is_none() {
            create_parent(&self.path)?;
            let writer = ParquetWriter::new(&self.temp_path, &schema.to_arrow(), &self.config)?;
            info!(
                path = %self.path.display(),
                columns = schema.len(),
                "Froze output schema at first batch"
            );
            self.writer = Some(writer);
            self.frozen = Some(schema.clone());
        }
        let (Some(writer), Some(frozen)) = (self.writer.as_mut(), self.frozen.as_ref()) else {
            return Err(Error::Other("append writer is not open".to_string()));
        };

        let drift = schema.drift_from(frozen);
        if !drift.is_empty() {
            match self.policy {
                DriftPolicy::Fail => {
                    return Err(Error::SchemaConflict {
                        batch: batch.index(),
                        conflicts: drift.iter().map(ToString::to_string).collect(),
                    });
                }
                DriftPolicy::Reject => {
                    warn!(
                        batch = batch.index(),
                        rows = batch.len(),
                        conflicts = drift.len(),
                        "Rejected batch with drifted schema"
                    );
                    return Ok(BatchOutcome::Rejected {
                        rows: batch.len(),
                        drift,
                    });
                }
                DriftPolicy::NullPad => {
                    warn!(
                        batch = batch.index(),
                        conflicts = drift.len(),
                        "Null-padding drifted columns"
                    );
                }
            }
        }

        let record_batch = encode_batch(batch, frozen)?;
        writer.write(&record_batch)?;
        debug!(
            batch = batch.index(),
            rows = record_batch.num_rows(),
            total = writer.rows_written(),
            "Appended batch"
        );

        Ok(BatchOutcome::Written {
            rows: record_batch.num_rows(),
            file: None,
            padded: drift,
        })
    }

    /// Close the file and move it into place
    ///
    /// Returns no files when no batch was ever written.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        let Some(writer) = self.writer.take() else {
            return Ok(Vec::new());
        };

        let finalized = writer.close().and_then(|rows| {
            fs::rename(&self.temp_path, &self.path)
                .map_err(|e| Error::write(&self.path, format!("failed to finalize file: {e}")))?;
            Ok(rows)
        });
        let rows = match finalized {
            Ok(rows) => rows,
            Err(e) => {
                let _ = fs::remove_file(&self.temp_path);
                return Err(e);
            }
        };
        info!(path = %self.path.display(), rows, "Finalized output file");

        Ok(vec![self.path.clone()])
    }

    /// Discard the in-progress file
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if self.writer.take().is_some() {
            match fs::remove_file(&self.temp_path) {
                Ok(()) => debug!(path = %self.temp_path.display(), "Removed in-progress file"),
                Err(e) => warn!(
                    path = %self.temp_path.display(),
                    error = %e,
                    "Failed to remove in-progress file"
                ),
            }
        }
    }
}

impl Drop for AppendSink {
    fn drop(&mut self) {
        self.discard();
    }
}

// ============================================================================
// Multi-file
// ============================================================================

/// One self-contained file per batch
#[derive(Debug)]
pub struct MultiFileSink {
    prefix: PathBuf,
    config: ParquetWriterConfig,
    files: Vec<PathBuf>,
}

impl MultiFileSink {
    /// Create a sink writing `<prefix>_batch_<n>.parquet` files
    pub fn new(prefix: impl Into<PathBuf>, config: ParquetWriterConfig) -> Self {
        Self {
            prefix: prefix.into(),
            config,
            files: Vec::new(),
        }
    }

    /// Files completed so far
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Write a batch to its own file
    pub fn write_batch(&mut self, batch: &Batch, schema: &ColumnSchema) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::Written {
                rows: 0,
                file: None,
                padded: Vec::new(),
            });
        }

        let path = OutputTarget::batch_path(&self.prefix, batch.index());
        let temp_path = in_progress_path(&path);
        create_parent(&path)?;

        let record_batch = encode_batch(batch, schema)?;
        let written = write_batch_to_parquet(&temp_path, &record_batch, &self.config)
            .and_then(|rows| {
                fs::rename(&temp_path, &path)
                    .map_err(|e| Error::write(&path, format!("failed to finalize file: {e}")))?;
                Ok(rows)
            });
        let rows = match written {
            Ok(rows) => rows,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        debug!(path = %path.display(), rows, "Wrote batch file");
        self.files.push(path.clone());

        Ok(BatchOutcome::Written {
            rows,
            file: Some(path),
            padded: Vec::new(),
        })
    }

    /// Files produced
    pub fn finish(self) -> Vec<PathBuf> {
        self.files
    }

    /// Completed files stay valid
    pub fn abort(self) {
        debug!(files = self.files.len(), "Stopped multi-file output");
    }
}

/// Create the parent directory of `path` if it has one
fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| Error::write(parent, format!("failed to create directory: {e}"))),
        _ => Ok(()),
    }
}
