//! Constraint evaluator: hard pass/fail filters applied before scoring.
//!
//! A constraint's shape is fixed when it is built from the column's
//! classification, so evaluation never sniffs record types.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::entities::{ColumnKind, Record, Value};

/// Per-column hard requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Constraint {
    /// Inclusive bounds; an unset bound does not filter.
    ///
    /// `observed` marks bounds taken from the dataset itself: they narrow
    /// nothing, so absent values pass them.
    Numeric {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        observed: bool,
    },
    /// Required value; `None` does not filter.
    Boolean {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<bool>,
    },
    /// Lowercased terms; empty list does not filter.
    Categorical {
        #[serde(rename = "includesTerms")]
        includes_terms: Vec<String>,
        #[serde(rename = "exactMatch")]
        exact_match: bool,
    },
}

impl Constraint {
    pub fn numeric(min: Option<f64>, max: Option<f64>) -> Self {
        Constraint::Numeric {
            min,
            max,
            observed: false,
        }
    }

    /// Bounds equal to a column's observed range.
    pub fn observed_range(min: Option<f64>, max: Option<f64>) -> Self {
        Constraint::Numeric {
            min,
            max,
            observed: true,
        }
    }

    pub fn boolean(value: Option<bool>) -> Self {
        Constraint::Boolean { value }
    }

    /// Terms are trimmed and lowercased; blank terms are dropped.
    pub fn categorical<I, S>(terms: I, exact_match: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let includes_terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Constraint::Categorical {
            includes_terms,
            exact_match,
        }
    }

    /// The constraint that lets every value through, shaped for `kind`.
    pub fn unconstrained(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Numeric => Self::numeric(None, None),
            ColumnKind::Boolean => Self::boolean(None),
            ColumnKind::Categorical => Self::categorical(Vec::<String>::new(), false),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Constraint::Numeric { .. } => ColumnKind::Numeric,
            Constraint::Boolean { .. } => ColumnKind::Boolean,
            Constraint::Categorical { .. } => ColumnKind::Categorical,
        }
    }

    /// True when the constraint filters nothing.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Constraint::Numeric { min, max, .. } => min.is_none() && max.is_none(),
            Constraint::Boolean { value } => value.is_none(),
            Constraint::Categorical { includes_terms, .. } => includes_terms.is_empty(),
        }
    }

    /// Absent or wrongly-typed values fail any active constraint, except
    /// absent values against an observed range.
    pub fn is_satisfied_by(&self, value: &Value) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        match self {
            Constraint::Numeric { min, max, observed } => match value.as_number() {
                Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                None => *observed && value.is_absent(),
            },
            Constraint::Boolean { value: wanted } => value.as_bool() == *wanted,
            Constraint::Categorical {
                includes_terms,
                exact_match,
            } => {
                let Some(token) = value.token() else {
                    return false;
                };
                includes_terms.iter().any(|term| {
                    if *exact_match {
                        token == *term
                    } else {
                        token.contains(term.as_str())
                    }
                })
            }
        }
    }
}

/// Failure counts for one evaluated column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFailures {
    pub column: String,
    /// Records failing this column's constraint, regardless of other columns.
    pub failures: usize,
    /// Records for which this is the first failing column.
    pub first_failures: usize,
}

/// One failing record and the first column it fails on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureSample {
    pub index: usize,
    pub column: String,
}

/// Why filtering removed records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDiagnostics {
    pub total: usize,
    pub passed: usize,
    pub columns: Vec<ColumnFailures>,
    pub samples: Vec<FailureSample>,
}

impl FilterDiagnostics {
    /// Column removing the most records, ties to the earliest evaluated.
    pub fn most_restrictive(&self) -> Option<&ColumnFailures> {
        self.columns
            .iter()
            .filter(|c| c.failures > 0)
            .fold(None, |best: Option<&ColumnFailures>, c| match best {
                Some(b) if b.failures >= c.failures => Some(b),
                _ => Some(c),
            })
    }
}

/// Constraints keyed by column plus the ordered list of columns to evaluate.
///
/// Constraints for columns outside `evaluated` are kept but never applied;
/// evaluated columns without a constraint impose no filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstraintSet {
    constraints: BTreeMap<String, Constraint>,
    evaluated: Vec<String>,
}

impl ConstraintSet {
    pub fn new(constraints: BTreeMap<String, Constraint>, evaluated: Vec<String>) -> Self {
        Self {
            constraints,
            evaluated,
        }
    }

    pub fn constraints(&self) -> &BTreeMap<String, Constraint> {
        &self.constraints
    }

    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    pub fn get(&self, column: &str) -> Option<&Constraint> {
        self.constraints.get(column)
    }

    fn active(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.evaluated
            .iter()
            .filter_map(|c| self.constraints.get(c).map(|k| (c.as_str(), k)))
    }

    /// First evaluated column whose constraint the record fails.
    pub fn first_failing_column(&self, record: &Record) -> Option<&str> {
        self.active()
            .find(|(column, constraint)| !constraint.is_satisfied_by(record.get(column)))
            .map(|(column, _)| column)
    }

    pub fn satisfies(&self, record: &Record) -> bool {
        self.first_failing_column(record).is_none()
    }

    /// Positions of the records passing every evaluated constraint.
    pub fn passing_indices(&self, records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.satisfies(r))
            .map(|(i, _)| i)
            .collect()
    }

    /// Records passing every evaluated constraint, in input order.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        let kept: Vec<Record> = self
            .passing_indices(records)
            .into_iter()
            .map(|i| records[i].clone())
            .collect();
        debug!("filter kept {} of {} records", kept.len(), records.len());
        kept
    }

    /// Per-column failure counts over `records` and up to `sample_limit`
    /// failing records with their first failing column.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn failure_breakdown(&self, records: &[Record], sample_limit: usize) -> FilterDiagnostics {
        let mut columns: Vec<ColumnFailures> = self
            .active()
            .map(|(column, _)| ColumnFailures {
                column: column.to_string(),
                failures: 0,
                first_failures: 0,
            })
            .collect();
        let mut samples = Vec::new();
        let mut passed = 0;

        for (index, record) in records.iter().enumerate() {
            let mut first: Option<usize> = None;
            for (slot, (column, constraint)) in self.active().enumerate() {
                if !constraint.is_satisfied_by(record.get(column)) {
                    columns[slot].failures += 1;
                    first.get_or_insert(slot);
                }
            }
            match first {
                Some(slot) => {
                    columns[slot].first_failures += 1;
                    if samples.len() < sample_limit {
                        samples.push(FailureSample {
                            index,
                            column: columns[slot].column.clone(),
                        });
                    }
                }
                None => passed += 1,
            }
        }

        FilterDiagnostics {
            total: records.len(),
            passed,
            columns,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_observed_range_when_value_absent_then_passes() {
        let range = Constraint::observed_range(Some(8.0), Some(16.0));

        assert!(range.is_satisfied_by(&Value::Absent));
        assert!(range.is_satisfied_by(&Value::Number(8.0)));
        assert!(!range.is_satisfied_by(&Value::Text("n/a".into())));
        assert!(!Constraint::numeric(Some(8.0), Some(16.0)).is_satisfied_by(&Value::Absent));
    }

    #[test]
    fn given_observed_range_when_serializing_then_flags_it() {
        let json = serde_json::to_value(Constraint::observed_range(Some(1.0), None)).unwrap();

        assert_eq!(json["observed"], true);
        assert!(serde_json::to_value(Constraint::numeric(Some(1.0), None))
            .unwrap()
            .get("observed")
            .is_none());
    }
}
