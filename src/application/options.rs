//! Engine configuration object as accepted from settings files.
//!
//! Field names follow the camelCase document format (`ignoredColumns`,
//! `columnAliases`, `constraints.includeColumns`, ...). Values here are
//! unresolved: column references may be aliases, differ in case, or not
//! exist at all. See [`crate::application::resolve`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Direction;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Columns excluded from constraints, tradeoffs and tree features.
    pub ignored_columns: Vec<String>,
    /// Alias to real column name; both sides match case-insensitively.
    pub column_aliases: BTreeMap<String, String>,
    pub constraints: ConstraintsConfig,
    pub tradeoffs: TradeoffsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstraintsConfig {
    /// Takes precedence over `exclude_columns` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_columns: Option<Vec<String>>,
    pub exclude_columns: Vec<String>,
    pub defaults: ConstraintDefaults,
    pub overrides: BTreeMap<String, ConstraintOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintDefaults {
    pub numeric: NumericDefaults,
    pub categorical: CategoricalDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumericDefaults {
    /// Bound every numeric column by its observed min/max.
    pub use_dataset_range: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalDefaults {
    pub includes: Vec<String>,
    pub exact: bool,
}

/// Partial constraint laid over the defaults for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
}

impl ConstraintOverride {
    pub fn has_numeric_fields(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn has_boolean_fields(&self) -> bool {
        self.value.is_some()
    }

    pub fn has_categorical_fields(&self) -> bool {
        self.includes.is_some() || self.exact.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeoffsConfig {
    /// Columns to score on, in contribution order.
    pub selected: Vec<String>,
    pub defaults: TradeoffDefaults,
    pub overrides: BTreeMap<String, TradeoffOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeoffDefaults {
    pub weight: f64,
    pub direction: Direction,
}

impl Default for TradeoffDefaults {
    fn default() -> Self {
        Self {
            weight: 1.0,
            direction: Direction::HigherIsBetter,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeoffOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// Regression tree parameters and feature selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub id_prefix: String,
    /// Split candidates; tradeoff then constrained columns when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_split: 4,
            min_samples_leaf: 2,
            id_prefix: "cart".into(),
            features: None,
        }
    }
}
