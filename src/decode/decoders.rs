//! Incremental record decoders
//!
//! Each decoder yields one `RawRecord` at a time from a buffered reader and
//! never holds more than the current record's bytes in memory.

use super::scanner::ByteScanner;
use super::types::{Position, RawRecord};
use crate::error::{Error, Result};
use crate::types::PathSelector;
use serde_json::Value;
use std::io::BufRead;

// ============================================================================
// Record Stream
// ============================================================================

/// Lazy, forward-only sequence of records at a path selector
///
/// The stream is not restartable: once it returns `None`, or after a fatal
/// error, it keeps returning `None`.
pub struct RecordStream<R> {
    inner: Inner<R>,
}

enum Inner<R> {
    Ndjson(NdjsonDecoder<R>),
    Array(ArrayDecoder<R>),
}

impl<R: BufRead> RecordStream<R> {
    /// Open a record stream over `reader`
    pub fn new(reader: R, selector: &PathSelector) -> Self {
        let inner = match selector {
            PathSelector::NdjsonLines => Inner::Ndjson(NdjsonDecoder::new(reader)),
            PathSelector::TopLevelArray => Inner::Array(ArrayDecoder::new(reader, Vec::new())),
            PathSelector::KeyPath(_) => Inner::Array(ArrayDecoder::new(
                reader,
                selector.segments().into_iter().map(String::from).collect(),
            )),
        };
        Self { inner }
    }

    /// Number of records yielded so far
    pub fn records_read(&self) -> u64 {
        match &self.inner {
            Inner::Ndjson(d) => d.ordinal,
            Inner::Array(d) => d.ordinal,
        }
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Ndjson(d) => d.next(),
            Inner::Array(d) => d.next(),
        }
    }
}

/// Parse captured bytes, reporting errors relative to where the value began
fn parse_value(bytes: &[u8], start: Position) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| {
        let line = start.line + (e.line() as u64).saturating_sub(1);
        let offset = if e.line() <= 1 {
            start.offset + (e.column() as u64).saturating_sub(1)
        } else {
            start.offset
        };
        Error::parse(line, offset, e.to_string())
    })
}

// ============================================================================
// NDJSON Decoder
// ============================================================================

/// JSON Lines decoder (one JSON value per line)
///
/// A malformed line yields an error for that line only; the decoder
/// resumes at the following line.
pub struct NdjsonDecoder<R> {
    reader: R,
    line_buf: Vec<u8>,
    position: Position,
    ordinal: u64,
    done: bool,
}

impl<R: BufRead> NdjsonDecoder<R> {
    /// Create a new NDJSON decoder
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::new(),
            position: Position::start(),
            ordinal: 0,
            done: false,
        }
    }

    fn next_record(&mut self) -> Option<Result<RawRecord>> {
        while !self.done {
            self.line_buf.clear();
            let start = self.position;
            let read = match self.reader.read_until(b'\n', &mut self.line_buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if read == 0 {
                self.done = true;
                return None;
            }

            self.position.offset += read as u64;
            self.position.line += 1;

            let mut line = self.line_buf.as_slice();
            if start.offset == 0 {
                line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
            }
            while let [rest @ .., b'\n' | b'\r'] = line {
                line = rest;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Some(match parse_value(line, start) {
                Ok(value) => {
                    self.ordinal += 1;
                    Ok(RawRecord::new(value, self.ordinal, start.line, start.offset))
                }
                Err(e) => Err(e),
            });
        }
        None
    }
}

// ============================================================================
// Array Decoder
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    /// Nothing consumed yet
    Start,
    /// Inside the target array, before the first item
    FirstItem,
    /// Inside the target array, after at least one item
    NextItem,
    /// The key path ended at a non-array value, which is the only record
    SingleValue,
    Finished,
}

/// Decoder for records held in a JSON array
///
/// With an empty key path the array is the document itself; otherwise the
/// decoder descends through object keys, skipping unrelated members
/// without materializing them. The whole document is read to its end, so
/// a malformed or truncated tail is still an error.
pub struct ArrayDecoder<R> {
    scanner: ByteScanner<R>,
    key_path: Vec<String>,
    state: ArrayState,
    /// Objects entered on the way down the key path and not yet closed
    open_objects: usize,
    value_buf: Vec<u8>,
    ordinal: u64,
}

impl<R: BufRead> ArrayDecoder<R> {
    /// Create a decoder for the array found at `key_path`
    pub fn new(reader: R, key_path: Vec<String>) -> Self {
        Self {
            scanner: ByteScanner::new(reader),
            key_path,
            state: ArrayState::Start,
            open_objects: 0,
            value_buf: Vec::new(),
            ordinal: 0,
        }
    }

    fn next_record(&mut self) -> Option<Result<RawRecord>> {
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                // A structural fault desynchronizes everything after it
                self.state = ArrayState::Finished;
                Some(Err(e))
            }
        }
    }

    fn advance(&mut self) -> Result<Option<RawRecord>> {
        loop {
            match self.state {
                ArrayState::Finished => return Ok(None),
                ArrayState::Start => {
                    self.scanner.skip_bom()?;
                    self.state = if self.key_path.is_empty() {
                        self.open_top_level()?
                    } else {
                        self.descend()?
                    };
                }
                ArrayState::SingleValue => {
                    let record = self.read_item()?;
                    self.finish_document()?;
                    self.state = ArrayState::Finished;
                    return Ok(Some(record));
                }
                ArrayState::FirstItem | ArrayState::NextItem => {
                    match self.scanner.skip_whitespace()? {
                        Some(b']') => {
                            self.scanner.bump()?;
                            self.finish_document()?;
                            self.state = ArrayState::Finished;
                            return Ok(None);
                        }
                        None => {
                            return Err(self.scanner.error("unexpected end of input inside array"))
                        }
                        Some(_) => {}
                    }
                    if self.state == ArrayState::NextItem {
                        self.scanner.expect(b',')?;
                    }
                    let record = self.read_item()?;
                    self.state = ArrayState::NextItem;
                    return Ok(Some(record));
                }
            }
        }
    }

    fn open_top_level(&mut self) -> Result<ArrayState> {
        match self.scanner.skip_whitespace()? {
            Some(b'[') => {
                self.scanner.bump()?;
                Ok(ArrayState::FirstItem)
            }
            Some(_) => Err(self.scanner.error("expected '[' at start of top-level array")),
            None => Err(self.scanner.error("unexpected end of input, expected top-level array")),
        }
    }

    /// Walk object keys down the key path
    fn descend(&mut self) -> Result<ArrayState> {
        let segments = self.key_path.clone();

        for segment in &segments {
            if self.scanner.skip_whitespace()? != Some(b'{') {
                // Intermediate value is not an object: the path does not exist
                tracing::debug!(segment = %segment, "key path segment is not inside an object");
                self.scanner.skip_value()?;
                self.finish_document()?;
                return Ok(ArrayState::Finished);
            }
            self.scanner.bump()?;
            self.open_objects += 1;

            if !self.seek_key(segment)? {
                tracing::debug!(segment = %segment, "key path segment not found");
                self.finish_document()?;
                return Ok(ArrayState::Finished);
            }
        }

        if self.scanner.skip_whitespace()? == Some(b'[') {
            self.scanner.bump()?;
            Ok(ArrayState::FirstItem)
        } else {
            Ok(ArrayState::SingleValue)
        }
    }

    /// Scan members of the current object until `key` is found
    ///
    /// Leaves the scanner positioned at the start of the matching value, or
    /// past the closing brace when the key is absent.
    fn seek_key(&mut self, key: &str) -> Result<bool> {
        let mut first = true;
        loop {
            match self.scanner.skip_whitespace()? {
                Some(b'}') => {
                    self.scanner.bump()?;
                    self.open_objects -= 1;
                    return Ok(false);
                }
                None => return Err(self.scanner.error("unexpected end of input inside object")),
                Some(_) => {}
            }
            if !first {
                self.scanner.expect(b',')?;
            }
            first = false;

            let name = self.scanner.read_key()?;
            self.scanner.expect(b':')?;
            if name == key {
                return Ok(true);
            }
            self.scanner.skip_value()?;
        }
    }

    fn read_item(&mut self) -> Result<RawRecord> {
        self.scanner.skip_whitespace()?;
        let start = self.scanner.position();
        self.value_buf.clear();
        self.scanner.capture_value(&mut self.value_buf)?;
        let value = parse_value(&self.value_buf, start)?;
        self.ordinal += 1;
        Ok(RawRecord::new(value, self.ordinal, start.line, start.offset))
    }

    /// Skip the remaining members of every enclosing object, then require
    /// end of input
    fn finish_document(&mut self) -> Result<()> {
        while self.open_objects > 0 {
            match self.scanner.skip_whitespace()? {
                Some(b'}') => {
                    self.scanner.bump()?;
                    self.open_objects -= 1;
                }
                Some(b',') => {
                    self.scanner.bump()?;
                    self.scanner.read_key()?;
                    self.scanner.expect(b':')?;
                    self.scanner.skip_value()?;
                }
                Some(b) => {
                    return Err(self.scanner.error(format!(
                        "expected ',' or '}}' after object member, found '{}'",
                        b as char
                    )))
                }
                None => return Err(self.scanner.error("unexpected end of input inside object")),
            }
        }
        match self.scanner.skip_whitespace()? {
            None => Ok(()),
            Some(_) => Err(self.scanner.error("trailing characters after document")),
        }
    }
}

impl<R: BufRead> Iterator for NdjsonDecoder<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

impl<R: BufRead> Iterator for ArrayDecoder<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}
