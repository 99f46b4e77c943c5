//! Error types for Solidafy Stream
//!
//! This module defines the error hierarchy for the whole conversion pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use serde::Serialize;
use thiserror::Error;

/// The main error type for Solidafy Stream
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Parse error at line {line}, byte {offset}: {message}")]
    Parse {
        line: u64,
        offset: u64,
        message: String,
    },

    #[error("Flatten error at '{path}': {message}")]
    Flatten { path: String, message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Schema conflict in batch {batch}: {}", .conflicts.join("; "))]
    SchemaConflict { batch: usize, conflicts: Vec<String> },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Encode error: {message}")]
    Encode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("Write error for '{path}': {message}")]
    Write { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Control Flow
    // ============================================================================
    #[error("Conversion cancelled after {records} records")]
    Cancelled { records: u64 },

    #[error("{0}")]
    Other(String),
}

/// Structural classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Parse,
    Flatten,
    SchemaConflict,
    Encode,
    Write,
    Io,
    Cancelled,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Parse => "parse",
            ErrorKind::Flatten => "flatten",
            ErrorKind::SchemaConflict => "schema_conflict",
            ErrorKind::Encode => "encode",
            ErrorKind::Write => "write",
            ErrorKind::Io => "io",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a parse error at the given position
    pub fn parse(line: u64, offset: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            offset,
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a write error for an output path
    pub fn write(path: impl AsRef<std::path::Path>, message: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::FileNotFound { .. } => ErrorKind::Config,
            Error::Parse { .. } | Error::JsonParse(_) => ErrorKind::Parse,
            Error::Flatten { .. } => ErrorKind::Flatten,
            Error::SchemaConflict { .. } => ErrorKind::SchemaConflict,
            Error::Encode { .. } => ErrorKind::Encode,
            Error::Write { .. } => ErrorKind::Write,
            Error::Io(_) => ErrorKind::Io,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Other(_) => ErrorKind::Other,
        }
    }
}

/// Result type alias for Solidafy Stream
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::parse(3, 41, "expected value");
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, byte 41: expected value"
        );

        let err = Error::SchemaConflict {
            batch: 2,
            conflicts: vec!["new column 'x'".into(), "column 'a' integer -> string".into()],
        };
        assert_eq!(
            err.to_string(),
            "Schema conflict in batch 2: new column 'x'; column 'a' integer -> string"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
        assert_eq!(Error::parse(1, 0, "x").kind(), ErrorKind::Parse);
        assert_eq!(Error::encode("x").kind(), ErrorKind::Encode);
        assert_eq!(Error::write("out.parquet", "disk full").kind(), ErrorKind::Write);
        assert_eq!(Error::Cancelled { records: 5 }.kind(), ErrorKind::Cancelled);
        assert_eq!(ErrorKind::SchemaConflict.to_string(), "schema_conflict");
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
