//! Structural JSON scanner
//!
//! Walks a buffered byte stream one byte at a time, tracking line and byte
//! offset. It understands just enough JSON structure (strings, escapes and
//! bracket depth) to copy a single value, which is then handed to
//! `serde_json`. Skipped values are never buffered whole: their structure is
//! checked here and each scalar token is checked by `serde_json`.

use super::types::Position;
use crate::error::{Error, Result};
use serde::de::IgnoredAny;
use std::io::BufRead;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Byte-level cursor over a `BufRead`
pub struct ByteScanner<R> {
    reader: R,
    position: Position,
}

impl<R: BufRead> ByteScanner<R> {
    /// Create a scanner at the start of a stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: Position::start(),
        }
    }

    /// Current position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Build a parse error at the current position
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.position.line, self.position.offset, message)
    }

    /// Look at the next byte without consuming it
    pub fn peek(&mut self) -> Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        Ok(buf.first().copied())
    }

    /// Consume the next byte
    pub fn bump(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if let Some(b) = byte {
            self.reader.consume(1);
            self.position.offset += 1;
            if b == b'\n' {
                self.position.line += 1;
            }
        }
        Ok(byte)
    }

    /// Skip a leading UTF-8 byte order mark
    pub fn skip_bom(&mut self) -> Result<()> {
        let buf = self.reader.fill_buf()?;
        if buf.starts_with(&UTF8_BOM) {
            self.reader.consume(UTF8_BOM.len());
            self.position.offset += UTF8_BOM.len() as u64;
        }
        Ok(())
    }

    /// Skip whitespace and return the next significant byte (not consumed)
    pub fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump()?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Consume `expected` after optional whitespace
    pub fn expect(&mut self, expected: u8) -> Result<()> {
        match self.skip_whitespace()? {
            Some(b) if b == expected => {
                self.bump()?;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                expected as char,
                printable(b)
            ))),
            None => Err(self.error(format!(
                "unexpected end of input, expected '{}'",
                expected as char
            ))),
        }
    }

    /// Read an object key (a JSON string) after optional whitespace
    pub fn read_key(&mut self) -> Result<String> {
        let start = self.position;
        match self.skip_whitespace()? {
            Some(b'"') => {}
            Some(b) => {
                return Err(self.error(format!(
                    "expected object key, found '{}'",
                    printable(b)
                )))
            }
            None => return Err(self.error("unexpected end of input, expected object key")),
        }

        let mut raw = Vec::new();
        self.scan_string(Some(&mut raw))?;
        serde_json::from_slice(&raw)
            .map_err(|e| Error::parse(start.line, start.offset, format!("invalid key: {e}")))
    }

    /// Copy the next value's bytes into `out`
    pub fn capture_value(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.scan_value(Some(out))
    }

    /// Skip the next value, rejecting malformed JSON
    ///
    /// Containers are walked with an explicit stack of expected closers, so
    /// only the current scalar token is ever held in memory.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut closers: Vec<u8> = Vec::new();
        let mut token = Vec::new();
        loop {
            match self.skip_whitespace()? {
                Some(b'{') => {
                    self.bump()?;
                    if self.skip_whitespace()? == Some(b'}') {
                        self.bump()?;
                    } else {
                        self.read_key()?;
                        self.expect(b':')?;
                        closers.push(b'}');
                        continue;
                    }
                }
                Some(b'[') => {
                    self.bump()?;
                    if self.skip_whitespace()? == Some(b']') {
                        self.bump()?;
                    } else {
                        closers.push(b']');
                        continue;
                    }
                }
                _ => {
                    let start = self.position;
                    token.clear();
                    self.scan_value(Some(&mut token))?;
                    serde_json::from_slice::<IgnoredAny>(&token)
                        .map_err(|e| Error::parse(start.line, start.offset, e.to_string()))?;
                }
            }

            // A value just ended: close containers until one wants another item
            loop {
                let Some(&closer) = closers.last() else {
                    return Ok(());
                };
                match self.skip_whitespace()? {
                    Some(b',') => {
                        self.bump()?;
                        if closer == b'}' {
                            self.read_key()?;
                            self.expect(b':')?;
                        }
                        break;
                    }
                    Some(b) if b == closer => {
                        self.bump()?;
                        closers.pop();
                    }
                    Some(b) => {
                        return Err(self.error(format!(
                            "expected ',' or '{}', found '{}'",
                            closer as char,
                            printable(b)
                        )))
                    }
                    None => return Err(self.error("unexpected end of input inside container")),
                }
            }
        }
    }

    fn scan_value(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        match self.skip_whitespace()? {
            None => Err(self.error("unexpected end of input, expected value")),
            Some(b'"') => self.scan_string(out),
            Some(b'{' | b'[') => self.scan_container(out),
            Some(b @ (b',' | b':' | b']' | b'}')) => {
                Err(self.error(format!("expected value, found '{}'", b as char)))
            }
            Some(_) => {
                // Literal or number: everything up to the next delimiter
                while let Some(b) = self.peek()? {
                    if matches!(b, b',' | b']' | b'}' | b' ' | b'\t' | b'\r' | b'\n') {
                        break;
                    }
                    self.bump()?;
                    if let Some(buf) = out.as_deref_mut() {
                        buf.push(b);
                    }
                }
                Ok(())
            }
        }
    }

    fn scan_string(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        // Opening quote
        self.bump()?;
        if let Some(buf) = out.as_deref_mut() {
            buf.push(b'"');
        }

        let mut escaped = false;
        loop {
            let Some(b) = self.bump()? else {
                return Err(self.error("unexpected end of input inside string"));
            };
            if let Some(buf) = out.as_deref_mut() {
                buf.push(b);
            }
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                return Ok(());
            }
        }
    }

    fn scan_container(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let Some(b) = self.peek()? else {
                return Err(self.error("unexpected end of input inside container"));
            };
            if b == b'"' {
                self.scan_string(out.as_deref_mut())?;
                continue;
            }

            self.bump()?;
            if let Some(buf) = out.as_deref_mut() {
                buf.push(b);
            }
            match b {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}

fn printable(b: u8) -> String {
    if b.is_ascii_graphic() {
        (b as char).to_string()
    } else {
        format!("\\x{b:02x}")
    }
}
