//! Scoring engine: normalized, weighted multi-criteria scores.
//!
//! For each tradeoff the column range is taken over the records being scored.
//! A raw value is normalized to `[0, 1]` within that range, flipped for
//! `lower_is_better`, and multiplied by the weight. Zero-width ranges and
//! non-numeric raw values contribute nothing in either direction.

use std::fmt;

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::entities::{ColumnKind, Record, Value};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::explain::most_influential;

/// Which raw extreme is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HigherIsBetter => write!(f, "higher_is_better"),
            Direction::LowerIsBetter => write!(f, "lower_is_better"),
        }
    }
}

/// A numeric column selected to influence scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tradeoff {
    column: String,
    weight: f64,
    direction: Direction,
}

impl Tradeoff {
    /// Rejects non-numeric columns and weights that are negative or not finite.
    pub fn new(
        column: impl Into<String>,
        kind: ColumnKind,
        weight: f64,
        direction: Direction,
    ) -> DomainResult<Self> {
        let column = column.into();
        if kind != ColumnKind::Numeric {
            return Err(DomainError::NonNumericTradeoff { column, kind });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(DomainError::InvalidWeight { column, weight });
        }
        Ok(Self {
            column,
            weight,
            direction,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Per-record, per-tradeoff decomposition of a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub column: String,
    pub direction: Direction,
    pub raw_value: Value,
    pub normalized_value: f64,
    pub directed_component: f64,
    pub weight: f64,
    pub weighted_contribution: f64,
}

/// A record with its total score and contribution breakdown.
///
/// `contributions` follows the order of the tradeoff selection. The record's
/// own columns serialise under `values` so they never collide with the
/// computed fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    /// Position of the record in the loaded dataset.
    pub index: usize,
    #[serde(rename = "values")]
    pub record: Record,
    pub score: f64,
    pub contributions: Vec<Contribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_factor: Option<String>,
}

impl ScoredRecord {
    pub fn get(&self, column: &str) -> &Value {
        self.record.get(column)
    }
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    /// `None` when the range has zero width.
    fn normalize(&self, raw: f64) -> Option<f64> {
        let width = self.max - self.min;
        (width > 0.0).then(|| ((raw - self.min) / width).clamp(0.0, 1.0))
    }
}

fn column_range(records: &[Record], column: &str) -> Option<Range> {
    match records
        .iter()
        .filter_map(|r| r.get(column).as_number())
        .minmax_by(|a, b| a.total_cmp(b))
    {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some(Range { min: v, max: v }),
        MinMaxResult::MinMax(min, max) => Some(Range { min, max }),
    }
}

fn contribution(tradeoff: &Tradeoff, range: Option<Range>, raw: &Value) -> Contribution {
    let normalized = raw
        .as_number()
        .zip(range)
        .and_then(|(v, r)| r.normalize(v));
    let directed = match (normalized, tradeoff.direction) {
        (Some(n), Direction::HigherIsBetter) => n,
        (Some(n), Direction::LowerIsBetter) => 1.0 - n,
        (None, _) => 0.0,
    };
    Contribution {
        column: tradeoff.column.clone(),
        direction: tradeoff.direction,
        raw_value: raw.clone(),
        normalized_value: normalized.unwrap_or(0.0),
        directed_component: directed,
        weight: tradeoff.weight,
        weighted_contribution: tradeoff.weight * directed,
    }
}

/// Score every record against the selected tradeoffs.
///
/// Output order matches input order and each `index` is the position in
/// `records`. With no tradeoffs every score is 0.
#[instrument(level = "debug", skip_all, fields(records = records.len(), tradeoffs = tradeoffs.len()))]
pub fn score_records(records: &[Record], tradeoffs: &[Tradeoff]) -> Vec<ScoredRecord> {
    let ranges: Vec<Option<Range>> = tradeoffs
        .iter()
        .map(|t| column_range(records, &t.column))
        .collect();
    for (tradeoff, range) in tradeoffs.iter().zip(&ranges) {
        trace!(column = %tradeoff.column, ?range, "tradeoff range");
    }

    let scored: Vec<ScoredRecord> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let contributions: Vec<Contribution> = tradeoffs
                .iter()
                .zip(&ranges)
                .map(|(t, range)| contribution(t, *range, record.get(&t.column)))
                .collect();
            let score = contributions.iter().map(|c| c.weighted_contribution).sum();
            let top_factor = most_influential(&contributions).map(|c| c.column.clone());
            ScoredRecord {
                index,
                record: record.clone(),
                score,
                contributions,
                top_factor,
            }
        })
        .collect();
    debug!("scored {} records", scored.len());
    scored
}
