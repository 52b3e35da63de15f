//! Variance-reduction regression tree (CART-style) over scored records.
//!
//! Each call greedily picks the feature/candidate split with the largest
//! reduction in the sum of squared errors (SSE) of the scores, then recurses.
//! Leaves predict the mean score of their members.

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::domain::entities::{ColumnKind, Value};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::scoring::ScoredRecord;

/// Minimum SSE reduction for a split to be taken.
pub const GAIN_EPSILON: f64 = 1e-9;

/// Upper bound on threshold candidates evaluated per numeric feature.
pub const MAX_THRESHOLD_CANDIDATES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// A column the builder may split on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub column: String,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn numeric(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FeatureKind::Numeric,
        }
    }

    pub fn categorical(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FeatureKind::Categorical,
        }
    }

    /// Booleans split like two-valued categoricals.
    pub fn for_column(column: impl Into<String>, kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Numeric => Self::numeric(column),
            ColumnKind::Boolean | ColumnKind::Categorical => Self::categorical(column),
        }
    }
}

/// Stopping rules and id scheme. Every field must be given explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Accepted for completeness; the split search does not reject splits that
    /// leave a child smaller than this. Only `min_samples_split` bounds leaf size.
    pub min_samples_leaf: usize,
    pub id_prefix: String,
}

impl BuildOptions {
    pub fn new(
        max_depth: usize,
        min_samples_split: usize,
        min_samples_leaf: usize,
        id_prefix: impl Into<String>,
    ) -> DomainResult<Self> {
        let id_prefix = id_prefix.into();
        if id_prefix.trim().is_empty() {
            return Err(DomainError::InvalidBuildOptions(
                "id_prefix must not be empty".into(),
            ));
        }
        Ok(Self {
            max_depth,
            min_samples_split,
            min_samples_leaf,
            id_prefix,
        })
    }
}

/// Split rule of an inner node. Records matching the rule go left.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRule {
    /// Numeric: `value <= threshold` goes left; non-numeric values go right.
    Threshold(f64),
    /// Categorical: token equal to `category` goes left; absent values go right.
    Category(String),
}

impl SplitRule {
    pub fn goes_left(&self, value: &Value) -> bool {
        match self {
            SplitRule::Threshold(t) => value.as_number().is_some_and(|v| v <= *t),
            SplitRule::Category(c) => value.token().is_some_and(|tok| tok == *c),
        }
    }

    /// Yes/no question asked at a node splitting `column` by this rule.
    pub fn question(&self, column: &str) -> String {
        match self {
            SplitRule::Threshold(t) => format!("{} <= {}?", column, format_threshold(*t)),
            SplitRule::Category(c) => format!("{} = {}?", column, c),
        }
    }
}

fn format_threshold(t: f64) -> String {
    let rounded = (t * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDiagnostics {
    pub sample_count: usize,
    /// SSE of the group divided by its size.
    pub variance_before: f64,
    /// Summed child SSE divided by the group size.
    pub variance_after: f64,
    /// SSE reduction achieved by the split.
    pub variance_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionLeaf {
    pub id: String,
    pub predicted_score: f64,
    pub members: Vec<ScoredRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionInner {
    pub id: String,
    pub split_column: String,
    #[serde(flatten)]
    pub rule: SplitRule,
    pub left: Box<RegressionTreeNode>,
    pub right: Box<RegressionTreeNode>,
    pub diagnostics: SplitDiagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegressionTreeNode {
    Leaf(RegressionLeaf),
    Inner(RegressionInner),
}

impl RegressionTreeNode {
    pub fn id(&self) -> &str {
        match self {
            RegressionTreeNode::Leaf(leaf) => &leaf.id,
            RegressionTreeNode::Inner(inner) => &inner.id,
        }
    }

    /// Leaves have depth 0, inner nodes 1 + max(left, right).
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Inner(inner) => 1 + inner.left.depth().max(inner.right.depth()),
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&RegressionLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a RegressionLeaf>) {
        match self {
            RegressionTreeNode::Leaf(leaf) => out.push(leaf),
            RegressionTreeNode::Inner(inner) => {
                inner.left.collect_leaves(out);
                inner.right.collect_leaves(out);
            }
        }
    }

    /// Every record under this node, leaf by leaf.
    pub fn members(&self) -> Vec<&ScoredRecord> {
        self.leaves()
            .into_iter()
            .flat_map(|leaf| leaf.members.iter())
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(leaf) => leaf.members.len(),
            RegressionTreeNode::Inner(inner) => inner.diagnostics.sample_count,
        }
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Sum of squared deviations from the mean; 0 for an empty group.
fn sse(scores: &[f64]) -> f64 {
    let m = mean(scores);
    scores.iter().map(|s| (s - m).powi(2)).sum()
}

/// Midpoints between consecutive distinct values, thinned to at most
/// [`MAX_THRESHOLD_CANDIDATES`] picked at uniform stride.
fn threshold_candidates(group: &[&ScoredRecord], column: &str) -> Vec<f64> {
    let distinct: Vec<f64> = group
        .iter()
        .filter_map(|r| r.get(column).as_number())
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup()
        .collect();
    let midpoints: Vec<f64> = distinct
        .iter()
        .tuple_windows()
        .map(|(a, b)| (a + b) / 2.0)
        .collect();
    if midpoints.len() <= MAX_THRESHOLD_CANDIDATES {
        return midpoints;
    }
    (0..MAX_THRESHOLD_CANDIDATES)
        .map(|i| midpoints[i * midpoints.len() / MAX_THRESHOLD_CANDIDATES])
        .collect()
}

/// Distinct tokens in first-seen order; fewer than two means no candidates.
fn category_candidates(group: &[&ScoredRecord], column: &str) -> Vec<String> {
    let tokens: Vec<String> = group
        .iter()
        .filter_map(|r| r.get(column).token())
        .unique()
        .collect();
    if tokens.len() < 2 {
        Vec::new()
    } else {
        tokens
    }
}

fn candidate_rules(group: &[&ScoredRecord], feature: &Feature) -> Vec<SplitRule> {
    match feature.kind {
        FeatureKind::Numeric => threshold_candidates(group, &feature.column)
            .into_iter()
            .map(SplitRule::Threshold)
            .collect(),
        FeatureKind::Categorical => category_candidates(group, &feature.column)
            .into_iter()
            .map(SplitRule::Category)
            .collect(),
    }
}

#[derive(Debug, Clone)]
struct BestSplit {
    feature: usize,
    rule: SplitRule,
    sse_children: f64,
    gain: f64,
}

/// Candidate with the strictly largest gain; the first found wins ties.
fn find_best_split(group: &[&ScoredRecord], features: &[Feature], sse_all: f64) -> Option<BestSplit> {
    let mut best: Option<BestSplit> = None;
    for (idx, feature) in features.iter().enumerate() {
        for rule in candidate_rules(group, feature) {
            let (left, right): (Vec<f64>, Vec<f64>) = group
                .iter()
                .partition_map(|r| {
                    if rule.goes_left(r.get(&feature.column)) {
                        itertools::Either::Left(r.score)
                    } else {
                        itertools::Either::Right(r.score)
                    }
                });
            let sse_children = sse(&left) + sse(&right);
            let gain = sse_all - sse_children;
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit {
                    feature: idx,
                    rule,
                    sse_children,
                    gain,
                });
            }
        }
    }
    best.filter(|b| b.gain > GAIN_EPSILON)
}

struct Builder<'a> {
    features: &'a [Feature],
    options: &'a BuildOptions,
    next_id: usize,
}

impl Builder<'_> {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.options.id_prefix, self.next_id);
        self.next_id += 1;
        id
    }

    fn leaf(&mut self, id: String, group: &[&ScoredRecord], scores: &[f64]) -> RegressionTreeNode {
        RegressionTreeNode::Leaf(RegressionLeaf {
            id,
            predicted_score: mean(scores),
            members: group.iter().map(|r| (*r).clone()).collect(),
        })
    }

    fn build(&mut self, group: &[&ScoredRecord], depth: usize) -> RegressionTreeNode {
        let id = self.next_id();
        let scores: Vec<f64> = group.iter().map(|r| r.score).collect();
        let sse_all = sse(&scores);

        if group.len() < self.options.min_samples_split
            || depth >= self.options.max_depth
            || sse_all == 0.0
        {
            trace!(%id, depth, n = group.len(), "stopping rule reached");
            return self.leaf(id, group, &scores);
        }

        let Some(best) = find_best_split(group, self.features, sse_all) else {
            trace!(%id, depth, n = group.len(), "no split improves SSE");
            return self.leaf(id, group, &scores);
        };

        let features = self.features;
        let column = &features[best.feature].column;
        let (left, right): (Vec<&ScoredRecord>, Vec<&ScoredRecord>) =
            group.iter().partition(|r| best.rule.goes_left(r.get(column)));
        trace!(%id, %column, gain = best.gain, left = left.len(), right = right.len(), "split");

        let n = group.len() as f64;
        let diagnostics = SplitDiagnostics {
            sample_count: group.len(),
            variance_before: sse_all / n,
            variance_after: best.sse_children / n,
            variance_gain: best.gain,
        };
        let left = self.build(&left, depth + 1);
        let right = self.build(&right, depth + 1);

        RegressionTreeNode::Inner(RegressionInner {
            id,
            split_column: column.clone(),
            rule: best.rule,
            left: Box::new(left),
            right: Box::new(right),
            diagnostics,
        })
    }
}

/// Build the regression tree over `records`.
///
/// Returns `None` when there are no records or no features. Ids are
/// `<id_prefix>-<n>` numbered in pre-order from 0.
#[instrument(level = "debug", skip_all, fields(records = records.len(), features = features.len()))]
pub fn build_regression_tree(
    records: &[ScoredRecord],
    features: &[Feature],
    options: &BuildOptions,
) -> Option<RegressionTreeNode> {
    if records.is_empty() || features.is_empty() {
        debug!("nothing to build a regression tree from");
        return None;
    }
    let group: Vec<&ScoredRecord> = records.iter().collect();
    let mut builder = Builder {
        features,
        options,
        next_id: 0,
    };
    let root = builder.build(&group, 0);
    debug!(depth = root.depth(), leaves = root.leaves().len(), "built regression tree");
    Some(root)
}
