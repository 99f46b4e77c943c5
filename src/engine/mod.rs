//! Conversion engine module
//!
//! Drives the pipeline for one input: parse, flatten, batch, then unify and
//! write each full batch. Strictly sequential; each run owns its batcher,
//! schema state and output handle.
//!
//! # Overview
//!
//! - [`Converter`] - configurable runner with observer and cancellation hooks
//! - [`convert`] - one-call conversion with default logging
//! - [`sample_schema`] - schema preview over the first records of an input
//! - [`ConversionReport`] - what happened, including skipped and rejected data

mod types;

pub use types::{
    CancellationToken, ConversionReport, Issue, IssueKind, ProgressEvent, ProgressObserver,
    TracingObserver,
};

use crate::batch::{Batch, Batcher};
use crate::config::ConvertOptions;
use crate::decode::{RawRecord, RecordStream};
use crate::error::{Error, Result};
use crate::flatten::Flattener;
use crate::output::{BatchOutcome, OutputSink, OutputTarget, ParquetWriterConfig};
use crate::schema::{unify, ColumnSchema, SchemaUnifier};
use chrono::Utc;
use std::io::BufRead;
use tracing::{debug, warn};

/// Convert `reader` into `target` with default progress logging
pub fn convert<R: BufRead>(
    reader: R,
    target: &OutputTarget,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    Converter::new(options.clone()).run(reader, target)
}

/// Streaming JSON to Parquet converter
pub struct Converter {
    options: ConvertOptions,
    observer: Box<dyn ProgressObserver>,
    cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Create a converter that logs progress through `tracing`
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            observer: Box::new(TracingObserver),
            cancellation: None,
        }
    }

    /// Replace the progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Stop the run when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Options in use
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Run one conversion
    ///
    /// On any error, including cancellation, an append-mode output file is
    /// removed; multi-file outputs completed before the error stay in place.
    pub fn run<R: BufRead>(
        &mut self,
        reader: R,
        target: &OutputTarget,
    ) -> Result<ConversionReport> {
        self.options.validate()?;

        let mut report = ConversionReport::new(Utc::now());
        let batcher = Batcher::new(self.options.batch_size)?;
        let mut sink = OutputSink::open(
            target,
            ParquetWriterConfig::from_options(&self.options),
            self.options.drift_policy,
        );

        self.observer.on_event(&ProgressEvent::Started {
            target: target.path(),
        });

        if let Err(e) = self.pump(reader, batcher, &mut sink, &mut report) {
            warn!(error = %e, records = report.records_read, "Conversion aborted");
            sink.abort();
            return Err(e);
        }

        report.files = sink.finish()?;
        report.finished_at = Utc::now();
        self.observer
            .on_event(&ProgressEvent::Finished { report: &report });

        Ok(report)
    }

    /// Move every record from the input into the sink
    fn pump<R: BufRead>(
        &mut self,
        reader: R,
        mut batcher: Batcher,
        sink: &mut OutputSink,
        report: &mut ConversionReport,
    ) -> Result<()> {
        let flattener = Flattener::from_options(&self.options);
        let mut records = RecordStream::new(reader, &self.options.path_selector);

        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled {
                    records: report.records_read,
                });
            }

            let Some(record) = next_record(&mut records, &self.options, report, &mut *self.observer)?
            else {
                break;
            };

            report.records_read += 1;
            let flat = flattener.flatten(&record.value);
            if let Some(batch) = batcher.accept(flat) {
                self.flush(&batch, sink, report)?;
            }
        }

        let last = batcher.finish();
        if !last.is_empty() {
            self.flush(&last, sink, report)?;
        }

        Ok(())
    }

    /// Unify and write one full batch
    fn flush(
        &mut self,
        batch: &Batch,
        sink: &mut OutputSink,
        report: &mut ConversionReport,
    ) -> Result<()> {
        let mut schema = unify(batch.records());
        if schema.is_empty() && sink.frozen_schema().is_none() {
            // Rows still need one column to be stored
            debug!(batch = batch.index(), "Batch has no columns, writing a null column");
            schema = ColumnSchema::null_column(self.options.root_column.as_str());
        }
        debug!(
            batch = batch.index(),
            rows = batch.len(),
            columns = schema.len(),
            "Flushing batch"
        );

        report.batches += 1;
        match sink.write_batch(batch, &schema)? {
            BatchOutcome::Written { rows, file, padded } => {
                report.records_written += rows as u64;
                if !padded.is_empty() {
                    report.columns_padded(batch.index(), &padded);
                    self.observer.on_event(&ProgressEvent::BatchPadded {
                        batch: batch.index(),
                        drift: &padded,
                    });
                }
                self.observer.on_event(&ProgressEvent::BatchWritten {
                    batch: batch.index(),
                    rows,
                    file: file.as_deref(),
                });
            }
            BatchOutcome::Rejected { rows, drift } => {
                report.batch_rejected(batch.index(), rows, &drift);
                self.observer.on_event(&ProgressEvent::BatchRejected {
                    batch: batch.index(),
                    rows,
                    drift: &drift,
                });
            }
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Pull the next good record, skipping malformed NDJSON lines if allowed
fn next_record<R: BufRead>(
    records: &mut RecordStream<R>,
    options: &ConvertOptions,
    report: &mut ConversionReport,
    observer: &mut dyn ProgressObserver,
) -> Result<Option<RawRecord>> {
    let skippable = options.skip_on_error && options.path_selector.is_line_delimited();

    for item in records.by_ref() {
        match item {
            Ok(record) => return Ok(Some(record)),
            Err(Error::Parse {
                line,
                offset,
                message,
            }) if skippable => {
                report.record_skipped(line, offset, message.as_str());
                observer.on_event(&ProgressEvent::RecordSkipped {
                    line,
                    offset,
                    message: &message,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Infer the schema of the first `sample` records of an input
///
/// Malformed NDJSON lines are skipped when `skip_on_error` is set.
pub fn sample_schema<R: BufRead>(
    reader: R,
    options: &ConvertOptions,
    sample: usize,
) -> Result<ColumnSchema> {
    options.validate()?;

    let flattener = Flattener::from_options(options);
    let mut records = RecordStream::new(reader, &options.path_selector);
    let mut report = ConversionReport::new(Utc::now());
    let mut unifier = SchemaUnifier::new();
    let mut observer = TracingObserver;

    while unifier.record_count() < sample {
        match next_record(&mut records, options, &mut report, &mut observer)? {
            Some(record) => unifier.observe(&flattener.flatten(&record.value)),
            None => break,
        }
    }

    debug!(
        records = unifier.record_count(),
        skipped = report.records_skipped,
        "Sampled schema"
    );
    Ok(unifier.finish())
}
