//! Balanced exploration tree: scored records arranged by recursive median split.
//!
//! This is a layout aid for browsing, not a predictive model. The shape depends
//! only on how many records there are; which record sits where depends only on
//! the stable ascending score order.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::scoring::ScoredRecord;

pub const EXPLORATION_ID_PREFIX: &str = "explore";

/// Node of the balanced tree.
///
/// Everything in `left` scores no higher than this node, everything in
/// `right` no lower.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationTreeNode {
    pub id: String,
    pub record: ScoredRecord,
    pub left: Option<Box<ExplorationTreeNode>>,
    pub right: Option<Box<ExplorationTreeNode>>,
}

impl ExplorationTreeNode {
    /// Number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.len()) + self.right.as_ref().map_or(0, |n| n.len())
    }

    /// Levels in this subtree; a single node has height 1.
    pub fn height(&self) -> usize {
        1 + self
            .left
            .as_ref()
            .map_or(0, |n| n.height())
            .max(self.right.as_ref().map_or(0, |n| n.height()))
    }

    /// Records in in-order (left, node, right), i.e. ascending score.
    pub fn in_order(&self) -> Vec<&ScoredRecord> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_in_order(&mut out);
        out
    }

    fn collect_in_order<'a>(&'a self, out: &mut Vec<&'a ScoredRecord>) {
        if let Some(left) = &self.left {
            left.collect_in_order(out);
        }
        out.push(&self.record);
        if let Some(right) = &self.right {
            right.collect_in_order(out);
        }
    }
}

/// Build the balanced tree, or `None` for an empty input.
///
/// Records are stably sorted by ascending score. For the inclusive index range
/// `[lo, hi]` the node takes `mid = lo + (hi - lo) / 2`, the lower median, and
/// the sub-ranges `[lo, mid - 1]` and `[mid + 1, hi]` become its children.
/// Node ids are `explore-<sorted index>`.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn build_exploration_tree(records: &[ScoredRecord]) -> Option<ExplorationTreeNode> {
    let mut sorted: Vec<&ScoredRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.score.total_cmp(&b.score));
    let tree = build_range(&sorted, 0);
    if let Some(root) = &tree {
        debug!(height = root.height(), "built exploration tree");
    }
    tree
}

fn build_range(sorted: &[&ScoredRecord], offset: usize) -> Option<ExplorationTreeNode> {
    if sorted.is_empty() {
        return None;
    }
    let mid = (sorted.len() - 1) / 2;
    Some(ExplorationTreeNode {
        id: format!("{}-{}", EXPLORATION_ID_PREFIX, offset + mid),
        record: sorted[mid].clone(),
        left: build_range(&sorted[..mid], offset).map(Box::new),
        right: build_range(&sorted[mid + 1..], offset + mid + 1).map(Box::new),
    })
}
