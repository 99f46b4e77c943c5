//! Flat record type

use serde::Serialize;
use serde_json::{Map, Value};

/// Ordered mapping from column name to leaf value
///
/// Column order is the order in which the flattener reached each leaf.
/// Names are unique: inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatRecord {
    columns: Map<String, Value>,
}

impl FlatRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, returning the previous value if the name was taken
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.columns.insert(name.into(), value)
    }

    /// Get a column value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate `(name, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert into a JSON object
    pub fn into_object(self) -> Map<String, Value> {
        self.columns
    }
}

impl From<Map<String, Value>> for FlatRecord {
    fn from(columns: Map<String, Value>) -> Self {
        Self { columns }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}
