//! Common types used throughout Solidafy Stream
//!
//! This module contains the option enums shared by the parser, flattener,
//! encoder and CLI.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Path Selector
// ============================================================================

/// Where the records live inside the input document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathSelector {
    /// Items of the top-level array: `[ {...}, {...} ]`
    #[default]
    TopLevelArray,
    /// One JSON value per line
    NdjsonLines,
    /// Items of the array found under a dotted key path: `{"data": {"items": [...]}}`
    KeyPath(String),
}

impl PathSelector {
    /// Create a key path selector
    pub fn key_path(path: impl Into<String>) -> Self {
        Self::KeyPath(path.into())
    }

    /// Key path segments, empty for the other selectors
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::KeyPath(path) => path.split('.').collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a malformed record only affects its own line
    pub fn is_line_delimited(&self) -> bool {
        matches!(self, Self::NdjsonLines)
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevelArray => write!(f, "top_level_array"),
            Self::NdjsonLines => write!(f, "ndjson"),
            Self::KeyPath(path) => write!(f, "key_path:{path}"),
        }
    }
}

impl FromStr for PathSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "top_level_array" | "array" | "item" => Ok(Self::TopLevelArray),
            "ndjson" | "jsonl" => Ok(Self::NdjsonLines),
            other => match other.strip_prefix("key_path:") {
                Some(path) if path.is_empty() || path.split('.').any(str::is_empty) => Err(
                    Error::invalid_value("path_selector", format!("empty key path segment in '{other}'")),
                ),
                Some(path) => Ok(Self::KeyPath(path.to_string())),
                None => Err(Error::invalid_value(
                    "path_selector",
                    format!("unknown selector '{other}' (expected top_level_array, ndjson or key_path:<path>)"),
                )),
            },
        }
    }
}

impl TryFrom<String> for PathSelector {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PathSelector> for String {
    fn from(selector: PathSelector) -> Self {
        selector.to_string()
    }
}

// ============================================================================
// Array Policy
// ============================================================================

/// How arrays inside a record are mapped to columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayPolicy {
    /// Items become indexed columns: `tags.0`, `tags.1`, ...
    #[default]
    Explode,
    /// The whole array is stored as one JSON-encoded string column
    Opaque,
}

impl fmt::Display for ArrayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explode => write!(f, "explode"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

impl FromStr for ArrayPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "explode" => Ok(Self::Explode),
            "opaque" => Ok(Self::Opaque),
            other => Err(Error::invalid_value(
                "array_policy",
                format!("unknown policy '{other}' (expected explode or opaque)"),
            )),
        }
    }
}

// ============================================================================
// Output Mode
// ============================================================================

/// How batches are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Every batch goes into one file
    #[default]
    Append,
    /// One file per batch: `<prefix>_batch_<n>.parquet`
    MultiFile,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::MultiFile => write!(f, "multi-file"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "append" | "single" => Ok(Self::Append),
            "multi-file" | "multi" => Ok(Self::MultiFile),
            other => Err(Error::invalid_value(
                "mode",
                format!("unknown mode '{other}' (expected append or multi-file)"),
            )),
        }
    }
}

// ============================================================================
// Compression
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Lz4,
    Brotli,
    None,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Snappy => "snappy",
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
            Self::Lz4 => "lz4",
            Self::Brotli => "brotli",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "gzip" => Ok(Self::Gzip),
            "lz4" => Ok(Self::Lz4),
            "brotli" => Ok(Self::Brotli),
            "none" | "uncompressed" => Ok(Self::None),
            other => Err(Error::invalid_value(
                "compression",
                format!("unknown codec '{other}'"),
            )),
        }
    }
}

impl From<Compression> for parquet::basic::Compression {
    fn from(codec: Compression) -> Self {
        use parquet::basic::{BrotliLevel, GzipLevel, ZstdLevel};
        match codec {
            Compression::Snappy => parquet::basic::Compression::SNAPPY,
            Compression::Zstd => parquet::basic::Compression::ZSTD(ZstdLevel::default()),
            Compression::Gzip => parquet::basic::Compression::GZIP(GzipLevel::default()),
            Compression::Lz4 => parquet::basic::Compression::LZ4_RAW,
            Compression::Brotli => parquet::basic::Compression::BROTLI(BrotliLevel::default()),
            Compression::None => parquet::basic::Compression::UNCOMPRESSED,
        }
    }
}

// ============================================================================
// Drift Policy
// ============================================================================

/// What append mode does with a batch whose schema diverges from the file's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftPolicy {
    /// Abort the conversion
    Fail,
    /// Drop the divergent batch and report it
    Reject,
    /// Write against the file schema; unknown columns dropped, bad values nulled
    #[default]
    NullPad,
}

impl fmt::Display for DriftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Reject => write!(f, "reject"),
            Self::NullPad => write!(f, "null-pad"),
        }
    }
}

impl FromStr for DriftPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "fail" | "strict" => Ok(Self::Fail),
            "reject" => Ok(Self::Reject),
            "null-pad" | "pad" => Ok(Self::NullPad),
            other => Err(Error::invalid_value(
                "drift_policy",
                format!("unknown policy '{other}' (expected fail, reject or null-pad)"),
            )),
        }
    }
}
