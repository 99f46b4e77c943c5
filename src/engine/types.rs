//! Engine types
//!
//! Conversion report, progress events and cancellation.

use crate::schema::SchemaDrift;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Report
// ============================================================================

/// Kind of problem recorded in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An NDJSON line failed to parse and was skipped
    RecordSkipped,
    /// A batch was dropped because its schema drifted
    BatchRejected,
    /// Drifted columns of a batch were written as nulls or dropped
    ColumnsNullPadded,
}

/// One problem that did not stop the conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// 1-based batch number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<usize>,
    /// 1-based input line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// Input byte offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Rows affected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    /// Columns involved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub message: String,
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    /// Records parsed from the input
    pub records_read: u64,
    /// Rows that reached an output file
    pub records_written: u64,
    /// Malformed lines skipped
    pub records_skipped: u64,
    /// Rows dropped with rejected batches
    pub records_rejected: u64,
    /// Non-empty batches flushed, rejected ones included
    pub batches: usize,
    /// Output files produced
    pub files: Vec<PathBuf>,
    /// Problems that did not stop the conversion
    pub issues: Vec<Issue>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ConversionReport {
    /// Start an empty report
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            records_read: 0,
            records_written: 0,
            records_skipped: 0,
            records_rejected: 0,
            batches: 0,
            files: Vec::new(),
            issues: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    /// Record a skipped line
    pub fn record_skipped(&mut self, line: u64, offset: u64, message: impl Into<String>) {
        self.records_skipped += 1;
        self.issues.push(Issue {
            kind: IssueKind::RecordSkipped,
            batch: None,
            line: Some(line),
            offset: Some(offset),
            rows: None,
            columns: Vec::new(),
            message: message.into(),
        });
    }

    /// Record a rejected batch
    pub fn batch_rejected(&mut self, batch: usize, rows: usize, drift: &[SchemaDrift]) {
        self.records_rejected += rows as u64;
        self.issues.push(Issue {
            kind: IssueKind::BatchRejected,
            batch: Some(batch),
            line: None,
            offset: None,
            rows: Some(rows as u64),
            columns: drift.iter().map(|d| d.column().to_string()).collect(),
            message: describe(drift),
        });
    }

    /// Record drifted columns written against the frozen schema
    pub fn columns_padded(&mut self, batch: usize, drift: &[SchemaDrift]) {
        self.issues.push(Issue {
            kind: IssueKind::ColumnsNullPadded,
            batch: Some(batch),
            line: None,
            offset: None,
            rows: None,
            columns: drift.iter().map(|d| d.column().to_string()).collect(),
            message: describe(drift),
        });
    }

    /// Issues of one kind
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Whether every record read was written
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Wall-clock duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

fn describe(drift: &[SchemaDrift]) -> String {
    drift
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Progress
// ============================================================================

/// Something that happened during a conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent<'a> {
    /// The conversion started
    Started { target: &'a Path },
    /// A malformed line was skipped
    RecordSkipped {
        line: u64,
        offset: u64,
        message: &'a str,
    },
    /// A batch reached the output
    BatchWritten {
        batch: usize,
        rows: usize,
        file: Option<&'a Path>,
    },
    /// A batch was written with drifted columns nulled
    BatchPadded {
        batch: usize,
        drift: &'a [SchemaDrift],
    },
    /// A batch was dropped
    BatchRejected {
        batch: usize,
        rows: usize,
        drift: &'a [SchemaDrift],
    },
    /// The conversion finished
    Finished { report: &'a ConversionReport },
}

/// Receives progress events from a converter
///
/// Implemented for any `FnMut(&ProgressEvent)`.
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent<'_>);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent<'_>),
{
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        self(event);
    }
}

/// Default observer: logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        match event {
            ProgressEvent::Started { target } => {
                info!(output = %target.display(), "Starting conversion");
            }
            ProgressEvent::RecordSkipped {
                line,
                offset,
                message,
            } => warn!(line, offset, error = message, "Skipped malformed record"),
            ProgressEvent::BatchWritten { batch, rows, file } => match file {
                Some(file) => info!(batch, rows, file = %file.display(), "Batch flushed"),
                None => info!(batch, rows, "Batch flushed"),
            },
            ProgressEvent::BatchPadded { batch, drift } => {
                for d in *drift {
                    warn!(batch, column = d.column(), "{d}");
                }
            }
            ProgressEvent::BatchRejected { batch, rows, drift } => {
                warn!(batch, rows, conflicts = drift.len(), "Batch rejected");
            }
            ProgressEvent::Finished { report } => {
                info!(
                    records = report.records_written,
                    skipped = report.records_skipped,
                    rejected = report.records_rejected,
                    batches = report.batches,
                    files = report.files.len(),
                    "Conversion complete"
                );
                debug!(duration_ms = report.duration_ms(), "Conversion timing");
            }
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Shared flag a caller sets to stop a running conversion
///
/// Checked once per record.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
