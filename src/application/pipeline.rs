//! Recompute pipeline: classify, resolve, filter, score, build trees.
//!
//! Every run starts from scratch and returns a new [`Snapshot`]; nothing is
//! cached or mutated between runs.

use serde::Serialize;
use tracing::{info, instrument};

use crate::application::options::{EngineConfig, TreeSettings};
use crate::application::resolve::{resolve, EffectiveConfig};
use crate::application::ApplicationResult;
use crate::domain::{
    build_exploration_tree, build_regression_tree, score_records, Dataset, ExplorationTreeNode,
    FilterDiagnostics, Record, RegressionTreeNode, Schema, ScoredRecord, TreeArena,
};

/// Failing records sampled into the diagnostics of an empty result.
pub const DIAGNOSTIC_SAMPLES: usize = 10;

/// Everything derived from one dataset and one configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub schema: Schema,
    pub effective: EffectiveConfig,
    pub total_records: usize,
    pub filtered_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    /// Surviving records in dataset order, each carrying its dataset index.
    pub scored: Vec<ScoredRecord>,
    pub exploration_tree: Option<ExplorationTreeNode>,
    pub regression_tree: Option<RegressionTreeNode>,
    pub exploration_display: TreeArena,
    pub regression_display: TreeArena,
    /// Present only when no record passed the filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<FilterDiagnostics>,
}

impl Snapshot {
    /// Scored records by descending score; ties keep dataset order.
    pub fn ranked(&self) -> Vec<&ScoredRecord> {
        let mut ranked: Vec<&ScoredRecord> = self.scored.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<&ScoredRecord> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.scored.is_empty()
    }
}

/// Run the full pipeline over `dataset`.
///
/// Fails only on invalid tree options. An empty filter result is reported
/// through [`Snapshot::diagnostics`].
#[instrument(level = "debug", skip_all, fields(records = dataset.len()))]
pub fn run_pipeline(
    dataset: &Dataset,
    config: &EngineConfig,
    tree: &TreeSettings,
) -> ApplicationResult<Snapshot> {
    let schema = Schema::classify(dataset);
    let effective = resolve(dataset, &schema, config, tree)?;

    let records = dataset.records();
    let passing = effective.constraints.passing_indices(records);
    let filtered: Vec<Record> = passing.iter().map(|&i| records[i].clone()).collect();
    let diagnostics = filtered.is_empty().then(|| {
        effective
            .constraints
            .failure_breakdown(records, DIAGNOSTIC_SAMPLES)
    });

    let mut scored = score_records(&filtered, &effective.tradeoffs);
    for (record, &index) in scored.iter_mut().zip(&passing) {
        record.index = index;
    }
    let exploration_tree = build_exploration_tree(&scored);
    let regression_tree =
        build_regression_tree(&scored, &effective.features, &effective.build_options);

    let label_column = dataset.label_column().map(str::to_string);
    let label = label_column.as_deref();
    let exploration_display = exploration_tree
        .as_ref()
        .map(|t| TreeArena::from_exploration(t, label))
        .unwrap_or_default();
    let regression_display = regression_tree
        .as_ref()
        .map(|t| TreeArena::from_regression(t, label))
        .unwrap_or_default();

    info!(
        total = dataset.len(),
        filtered = filtered.len(),
        tradeoffs = effective.tradeoffs.len(),
        "pipeline complete"
    );
    Ok(Snapshot {
        schema,
        total_records: dataset.len(),
        filtered_records: filtered.len(),
        label_column,
        scored,
        exploration_tree,
        regression_tree,
        exploration_display,
        regression_display,
        diagnostics,
        effective,
    })
}
