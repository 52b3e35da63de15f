//! Dataset loading service
//!
//! Reads option tables from JSON documents. Values arrive already typed;
//! no text coercion is attempted.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, PathContext};
use crate::domain::{Dataset, Record, Value};
use crate::infrastructure::traits::FileSystem;

/// Service for reading datasets from disk.
pub struct DatasetService {
    fs: Arc<dyn FileSystem>,
}

impl DatasetService {
    /// Create a new dataset service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load a dataset file.
    ///
    /// Accepts a top-level array of objects or `{"records": [...]}`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Dataset> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::dataset(path, "file not found"));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read dataset", path)?;
        let dataset = parse_dataset(&content, path)?;
        debug!(
            records = dataset.len(),
            columns = dataset.columns().len(),
            "loaded dataset"
        );
        Ok(dataset)
    }
}

/// Parse a JSON dataset document; `path` is only used in error messages.
///
/// Columns are ordered by first appearance across records.
pub fn parse_dataset(content: &str, path: &Path) -> ApplicationResult<Dataset> {
    let document: Json = serde_json::from_str(content)
        .map_err(|e| ApplicationError::dataset(path, format!("invalid JSON: {}", e)))?;

    let rows = match document {
        Json::Array(rows) => rows,
        Json::Object(mut map) => match map.remove("records") {
            Some(Json::Array(rows)) => rows,
            _ => {
                return Err(ApplicationError::dataset(
                    path,
                    "expected an array of records or an object with a \"records\" array",
                ))
            }
        },
        _ => {
            return Err(ApplicationError::dataset(
                path,
                "expected an array of records or an object with a \"records\" array",
            ))
        }
    };

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let Json::Object(fields) = row else {
            return Err(ApplicationError::dataset(
                path,
                format!("record {} is not an object", index),
            ));
        };
        records.push(parse_record(fields, index, &mut columns, path)?);
    }
    Ok(Dataset::new(columns, records))
}

fn parse_record(
    fields: Map<String, Json>,
    index: usize,
    columns: &mut Vec<String>,
    path: &Path,
) -> ApplicationResult<Record> {
    let mut record = Record::new();
    for (column, raw) in fields {
        let value = match raw {
            Json::Null => Value::Absent,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
                ApplicationError::dataset(
                    path,
                    format!("record {}: number in '{}' is out of range", index, column),
                )
            })?,
            Json::String(s) => Value::Text(s),
            Json::Array(_) | Json::Object(_) => {
                return Err(ApplicationError::dataset(
                    path,
                    format!("record {}: nested value in column '{}'", index, column),
                ))
            }
        };
        if !columns.contains(&column) {
            columns.push(column.clone());
        }
        record.insert(column, value);
    }
    Ok(record)
}
