//! Record flattening
//!
//! Turns a nested JSON value into a `FlatRecord` keyed by joined key paths,
//! and back again.

use super::types::FlatRecord;
use crate::config::{ConvertOptions, DEFAULT_MAX_DEPTH};
use crate::types::ArrayPolicy;
use serde_json::{Map, Value};

/// Flattener with configuration options
#[derive(Debug, Clone)]
pub struct Flattener {
    /// How arrays become columns
    array_policy: ArrayPolicy,
    /// Joins path segments into column names
    separator: String,
    /// Column name for a record that is a bare scalar
    root_column: String,
    /// Containers deeper than this are stored as JSON text
    max_depth: usize,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(ArrayPolicy::default())
    }
}

impl Flattener {
    /// Create a flattener with the given array policy
    pub fn new(array_policy: ArrayPolicy) -> Self {
        Self {
            array_policy,
            separator: ".".to_string(),
            root_column: "value".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a flattener from conversion options
    pub fn from_options(options: &ConvertOptions) -> Self {
        Self {
            array_policy: options.array_policy,
            separator: options.separator.clone(),
            root_column: options.root_column.clone(),
            max_depth: options.max_depth,
        }
    }

    /// Set the separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the root column name
    #[must_use]
    pub fn with_root_column(mut self, name: impl Into<String>) -> Self {
        self.root_column = name.into();
        self
    }

    /// Set the maximum depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Get the array policy
    pub fn array_policy(&self) -> ArrayPolicy {
        self.array_policy
    }

    /// Flatten one value
    ///
    /// Never fails: every JSON value has a flattening. Empty objects, and
    /// empty arrays under `Explode`, contribute no columns.
    pub fn flatten(&self, value: &Value) -> FlatRecord {
        let mut record = FlatRecord::new();
        let mut path = String::new();
        self.walk(value, &mut path, 0, &mut record);
        record
    }

    fn walk(&self, value: &Value, path: &mut String, depth: usize, out: &mut FlatRecord) {
        match value {
            Value::Object(map) => {
                if depth >= self.max_depth && !map.is_empty() {
                    self.emit(path, Value::String(value.to_string()), out);
                    return;
                }
                for (key, child) in map {
                    let len = path.len();
                    self.push_segment(path, key);
                    self.walk(child, path, depth + 1, out);
                    path.truncate(len);
                }
            }
            Value::Array(items) => {
                let opaque = match self.array_policy {
                    ArrayPolicy::Opaque => true,
                    ArrayPolicy::Explode => depth >= self.max_depth && !items.is_empty(),
                };
                if opaque {
                    self.emit(path, Value::String(value.to_string()), out);
                    return;
                }
                for (index, child) in items.iter().enumerate() {
                    let len = path.len();
                    self.push_segment(path, &index.to_string());
                    self.walk(child, path, depth + 1, out);
                    path.truncate(len);
                }
            }
            scalar => self.emit(path, scalar.clone(), out),
        }
    }

    fn push_segment(&self, path: &mut String, segment: &str) {
        if !path.is_empty() {
            path.push_str(&self.separator);
        }
        path.push_str(segment);
    }

    fn emit(&self, path: &str, value: Value, out: &mut FlatRecord) {
        let name = if path.is_empty() {
            self.root_column.as_str()
        } else {
            path
        };
        if out.insert(name, value).is_some() {
            tracing::debug!(column = %name, "duplicate column path, keeping last value");
        }
    }

    /// Rebuild a nested value from a flat record
    ///
    /// Objects whose keys are exactly `0..n` become arrays. A record made of
    /// the root column alone becomes that scalar.
    pub fn unflatten(&self, record: &FlatRecord) -> Value {
        if record.len() == 1 {
            if let Some(value) = record.get(&self.root_column) {
                return value.clone();
            }
        }

        let mut root = Map::new();
        for (name, value) in record.iter() {
            let segments: Vec<&str> = name.split(self.separator.as_str()).collect();
            insert_path(&mut root, &segments, value.clone());
        }
        rebuild_arrays(Value::Object(root))
    }
}

fn insert_path(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        node.insert((*first).to_string(), value);
        return;
    }

    let child = node
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        insert_path(map, rest, value);
    }
}

fn rebuild_arrays(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_sequence = !map.is_empty()
                && map
                    .keys()
                    .enumerate()
                    .all(|(i, key)| *key == i.to_string());
            if is_sequence {
                Value::Array(map.into_iter().map(|(_, v)| rebuild_arrays(v)).collect())
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, rebuild_arrays(v)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}
