//! Column classifier: infers the semantic type of each column.
//!
//! Policy: a column is numeric if *any* record holds a number in it, else
//! boolean if any record holds a boolean, else categorical. Mixed columns are
//! therefore classified by their "strongest" observed type; a column with a
//! single stray number among text values becomes numeric.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::entities::{ColumnKind, Dataset, Record, Value};

/// Classify one column by scanning every record.
pub fn classify_column(records: &[Record], column: &str) -> ColumnKind {
    let mut saw_bool = false;
    for record in records {
        match record.get(column) {
            Value::Number(_) => return ColumnKind::Numeric,
            Value::Bool(_) => saw_bool = true,
            _ => {}
        }
    }
    if saw_bool {
        ColumnKind::Boolean
    } else {
        ColumnKind::Categorical
    }
}

/// Name and inferred kind of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Classification of every column in a dataset, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
}

impl Schema {
    #[instrument(level = "debug", skip(dataset), fields(columns = dataset.columns().len()))]
    pub fn classify(dataset: &Dataset) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .map(|name| ColumnInfo {
                name: name.clone(),
                kind: classify_column(dataset.records(), name),
            })
            .collect::<Vec<_>>();
        debug!("classified {} columns", columns.len());
        Self { columns }
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
