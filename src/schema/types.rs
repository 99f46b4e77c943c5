//! Schema types

use arrow::datatypes::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inferred type of one column
///
/// Ordered as a join semilattice: `Null` is the bottom, `String` the top,
/// `Integer` widens to `Float`, and `Boolean` only joins with itself and
/// `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
}

impl ColumnType {
    /// Type of a single leaf value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Number(n) => {
                if n.is_i64() {
                    ColumnType::Integer
                } else {
                    // Fractions, exponents and u64 values past i64::MAX
                    ColumnType::Float
                }
            }
            // Containers only reach here as opaque text
            Value::String(_) | Value::Array(_) | Value::Object(_) => ColumnType::String,
        }
    }

    /// Merge two types, returning the narrowest type that holds both
    pub fn merge_with(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Null, other) | (other, ColumnType::Null) => other,
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                ColumnType::Float
            }
            // Incompatible types - fall back to string
            _ => ColumnType::String,
        }
    }

    /// Whether values of `other` fit a column of this type without widening
    pub fn accepts(self, other: ColumnType) -> bool {
        self.merge_with(other) == self
    }

    /// Arrow storage type
    pub fn to_arrow(self) -> DataType {
        match self {
            ColumnType::Null => DataType::Null,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::String => DataType::Utf8,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Null => write!(f, "null"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

/// One named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (joined key path)
    pub name: String,
    /// Inferred type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    /// Create a column definition
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered columns of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Columns in first-seen order
    pub columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    /// Create a schema from column definitions
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// A single all-null column, for rows that flattened to no columns
    pub fn null_column(name: impl Into<String>) -> Self {
        Self::new(vec![ColumnDef::new(name, ColumnType::Null)])
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Type of a column
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.get(name).map(|c| c.column_type)
    }

    /// Arrow schema; every column is nullable
    pub fn to_arrow(&self) -> Schema {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(&c.name, c.column_type.to_arrow(), true))
            .collect();
        Schema::new(fields)
    }

    /// Differences that keep this batch from being written against `frozen`
    ///
    /// Columns of `frozen` missing here are not drift: they are null-filled.
    pub fn drift_from(&self, frozen: &ColumnSchema) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();
        for column in &self.columns {
            match frozen.column_type(&column.name) {
                None => drift.push(SchemaDrift::NewColumn {
                    name: column.name.clone(),
                    found: column.column_type,
                }),
                Some(expected) if !expected.accepts(column.column_type) => {
                    drift.push(SchemaDrift::TypeChanged {
                        name: column.name.clone(),
                        expected,
                        found: column.column_type,
                    });
                }
                Some(_) => {}
            }
        }
        drift
    }
}

/// A column-level difference between a batch and the file schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "drift", rename_all = "snake_case")]
pub enum SchemaDrift {
    /// The batch has a column the file does not
    NewColumn { name: String, found: ColumnType },
    /// The batch's type does not fit the file's column type
    TypeChanged {
        name: String,
        expected: ColumnType,
        found: ColumnType,
    },
}

impl SchemaDrift {
    /// Name of the affected column
    pub fn column(&self) -> &str {
        match self {
            SchemaDrift::NewColumn { name, .. } | SchemaDrift::TypeChanged { name, .. } => name,
        }
    }
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDrift::NewColumn { name, found } => {
                write!(f, "new column '{name}' ({found})")
            }
            SchemaDrift::TypeChanged {
                name,
                expected,
                found,
            } => write!(f, "column '{name}' is {expected} in file, {found} in batch"),
        }
    }
}
