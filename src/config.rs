//! Conversion options
//!
//! `ConvertOptions` collects every knob of a conversion. It can be built in
//! code with the `with_*` methods or loaded from a YAML/JSON file; CLI flags
//! are layered on top of the file values.

use crate::error::{Error, Result};
use crate::types::{ArrayPolicy, Compression, DriftPolicy, OutputMode, PathSelector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of records per batch
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default nesting depth before sub-structures are stored opaquely
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for one conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Where the records live in the input
    pub path_selector: PathSelector,

    /// Maximum records per batch
    pub batch_size: usize,

    /// How nested arrays become columns
    pub array_policy: ArrayPolicy,

    /// One file or one file per batch
    pub mode: OutputMode,

    /// Parquet compression codec
    pub compression: Compression,

    /// Append-mode handling of batches that diverge from the file schema
    pub drift_policy: DriftPolicy,

    /// Skip malformed NDJSON lines instead of aborting
    pub skip_on_error: bool,

    /// Column name separator
    pub separator: String,

    /// Column name used for a record that is a bare scalar
    pub root_column: String,

    /// Containers nested deeper than this are stored as JSON text
    pub max_depth: usize,

    /// Parquet row group size (rows)
    pub row_group_size: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            path_selector: PathSelector::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            array_policy: ArrayPolicy::default(),
            mode: OutputMode::default(),
            compression: Compression::default(),
            drift_policy: DriftPolicy::default(),
            skip_on_error: false,
            separator: ".".to_string(),
            root_column: "value".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ConvertOptions {
    /// Create options with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read options file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let options: Self = serde_json::from_str(&content)?;
            options.validate()?;
            Ok(options)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Load options from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse options YAML: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options describe a runnable conversion
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be at least 1"));
        }

        if self.separator.is_empty() {
            return Err(Error::invalid_value("separator", "cannot be empty"));
        }

        if self.root_column.is_empty() {
            return Err(Error::invalid_value("root_column", "cannot be empty"));
        }

        if self.max_depth == 0 {
            return Err(Error::invalid_value("max_depth", "must be at least 1"));
        }

        if self.row_group_size == 0 {
            return Err(Error::invalid_value("row_group_size", "must be at least 1"));
        }

        if let PathSelector::KeyPath(path) = &self.path_selector {
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(Error::invalid_value(
                    "path_selector",
                    format!("invalid key path '{path}'"),
                ));
            }
        }

        Ok(())
    }

    /// Set the path selector
    #[must_use]
    pub fn with_path_selector(mut self, selector: PathSelector) -> Self {
        self.path_selector = selector;
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the array policy
    #[must_use]
    pub fn with_array_policy(mut self, policy: ArrayPolicy) -> Self {
        self.array_policy = policy;
        self
    }

    /// Set the output mode
    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the drift policy
    #[must_use]
    pub fn with_drift_policy(mut self, policy: DriftPolicy) -> Self {
        self.drift_policy = policy;
        self
    }

    /// Enable or disable skipping malformed NDJSON lines
    #[must_use]
    pub fn with_skip_on_error(mut self, enabled: bool) -> Self {
        self.skip_on_error = enabled;
        self
    }

    /// Set the column name separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the column that holds scalar records
    #[must_use]
    pub fn with_root_column(mut self, name: impl Into<String>) -> Self {
        self.root_column = name.into();
        self
    }

    /// Set the maximum flattening depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the Parquet row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }
}
