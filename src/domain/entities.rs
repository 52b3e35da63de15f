//! Domain entities: cell values, records and datasets

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value.
///
/// `Absent` marks an empty or missing cell. It is a marker, not a type, and is
/// ignored by column classification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

static ABSENT: Value = Value::Absent;

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Case-insensitive token used for categorical comparison.
    ///
    /// Absent values have no token.
    pub fn token(&self) -> Option<String> {
        match self {
            Value::Absent => None,
            other => Some(other.to_string().trim().to_lowercase()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Absent => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Semantic type of a column, inferred by the column classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Categorical => "categorical",
        };
        f.pad(s)
    }
}

/// One row of the option table: column name to value, in insertion order.
///
/// Missing columns read as [`Value::Absent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&ABSENT)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Display label: the value of `label_column` if present, else `#<index>`.
    pub fn label(&self, label_column: Option<&str>, index: usize) -> String {
        label_column
            .map(|c| self.get(c))
            .filter(|v| !v.is_absent())
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// A table of records with a stable column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset with an explicit column order.
    ///
    /// Columns that appear in records but not in `columns` are appended in
    /// sorted order.
    pub fn new(mut columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut extra: Vec<String> = records
            .iter()
            .flat_map(|r| r.columns())
            .filter(|c| !columns.iter().any(|k| k.as_str() == *c))
            .map(str::to_string)
            .collect();
        extra.sort();
        extra.dedup();
        columns.extend(extra);
        Self { columns, records }
    }

    /// Create a dataset whose column order is the sorted union of record keys.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(Vec::new(), records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive lookup of a column name.
    pub fn resolve_column(&self, name: &str) -> Option<&str> {
        let wanted = name.trim();
        self.columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }

    /// Column used to label records in output: `name` if present, else the
    /// first column holding only text values.
    pub fn label_column(&self) -> Option<&str> {
        if let Some(name) = self.resolve_column("name") {
            return Some(name);
        }
        self.columns
            .iter()
            .find(|c| {
                let mut values = self.records.iter().map(|r| r.get(c)).peekable();
                values.peek().is_some()
                    && values.all(|v| matches!(v, Value::Text(_) | Value::Absent))
            })
            .map(String::as_str)
    }
}
