use std::fmt;

use generational_arena::{Arena, Index};
use serde::ser::{Serialize, Serializer};
use termtree::Tree;
use tracing::instrument;

use crate::domain::balanced::ExplorationTreeNode;
use crate::domain::explain::{best_member, group_factor};
use crate::domain::regression::RegressionTreeNode;
use crate::domain::scoring::ScoredRecord;

/// Payload of a display node: an option to show, or a question to ask.
///
/// Serialised with `"type": "option"` or `"type": "decision"`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeData {
    #[serde(rename = "option", rename_all = "camelCase")]
    Choice {
        label: String,
        score: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        top_factor: Option<String>,
        /// Mean score of the regression leaf this option represents.
        #[serde(skip_serializing_if = "Option::is_none")]
        predicted_score: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Decision {
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        factor: Option<String>,
        sample_count: usize,
    },
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Choice {
                label,
                score,
                top_factor,
                predicted_score,
            } => {
                write!(f, "{} [{:.3}]", label, score)?;
                if let Some(p) = predicted_score {
                    write!(f, " leaf mean {:.3}", p)?;
                }
                if let Some(factor) = top_factor {
                    write!(f, " top: {}", factor)?;
                }
                Ok(())
            }
            NodeData::Decision {
                question,
                factor,
                sample_count,
            } => {
                write!(f, "{} ({} options)", question, sample_count)?;
                if let Some(factor) = factor {
                    write!(f, " driven by {}", factor)?;
                }
                Ok(())
            }
        }
    }
}

/// Tree node in the arena-based display structure.
#[derive(Debug)]
pub struct TreeNode {
    pub id: String,
    /// Label of the edge from the parent, e.g. "yes"/"no" or "lower"/"higher"
    pub edge: Option<&'static str>,
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, left child first
    pub children: Vec<Index>,
}

/// Display tree shared by both tree kinds, stored in a generational arena.
///
/// Nodes refer to each other by [`Index`]; the first node inserted without a
/// parent becomes the root.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node below `parent`, or as the root when `parent` is `None`.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert_node(
        &mut self,
        id: String,
        edge: Option<&'static str>,
        data: NodeData,
        parent: Option<Index>,
    ) -> Index {
        let idx = self.arena.insert(TreeNode {
            id,
            edge,
            data,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => {
                if let Some(parent) = self.arena.get_mut(p) {
                    parent.children.push(idx);
                }
            }
            None => self.root = Some(idx),
        }
        idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Parents before children, left to right.
    pub fn iter(&self) -> Walk<'_> {
        Walk::new(self, Order::Pre)
    }

    /// Children before parents, left to right.
    pub fn iter_postorder(&self) -> Walk<'_> {
        Walk::new(self, Order::Post)
    }

    /// Number of levels; a lone root has depth 1, an empty tree 0.
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.levels(root))
    }

    fn levels(&self, idx: Index) -> usize {
        self.arena.get(idx).map_or(0, |node| {
            1 + node
                .children
                .iter()
                .map(|&child| self.levels(child))
                .max()
                .unwrap_or(0)
        })
    }

    /// Leaf nodes (no children) in left-to-right order.
    pub fn leaf_nodes(&self) -> Vec<&TreeNode> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node)
            .collect()
    }

    /// Arrange the balanced tree for display. Every node is an option.
    #[instrument(level = "debug", skip_all)]
    pub fn from_exploration(
        root: &ExplorationTreeNode,
        label_column: Option<&str>,
    ) -> Self {
        let mut tree = Self::new();
        tree.add_exploration(root, None, None, label_column);
        tree
    }

    fn add_exploration(
        &mut self,
        node: &ExplorationTreeNode,
        edge: Option<&'static str>,
        parent: Option<Index>,
        label_column: Option<&str>,
    ) {
        let data = option_data(&node.record, label_column, &node.id, None);
        let idx = self.insert_node(node.id.clone(), edge, data, parent);
        if let Some(left) = &node.left {
            self.add_exploration(left, Some("lower"), Some(idx), label_column);
        }
        if let Some(right) = &node.right {
            self.add_exploration(right, Some("higher"), Some(idx), label_column);
        }
    }

    /// Map the regression tree into the balanced tree's display shape.
    ///
    /// Inner nodes become decisions labelled with their question and the most
    /// relevant factor of the group's best option; leaves become their
    /// highest-scoring member.
    #[instrument(level = "debug", skip_all)]
    pub fn from_regression(
        root: &RegressionTreeNode,
        label_column: Option<&str>,
    ) -> Self {
        let mut tree = Self::new();
        tree.add_regression(root, None, None, label_column);
        tree
    }

    fn add_regression(
        &mut self,
        node: &RegressionTreeNode,
        edge: Option<&'static str>,
        parent: Option<Index>,
        label_column: Option<&str>,
    ) {
        match node {
            RegressionTreeNode::Leaf(leaf) => {
                if let Some(best) = best_member(&leaf.members) {
                    let data =
                        option_data(best, label_column, &leaf.id, Some(leaf.predicted_score));
                    self.insert_node(leaf.id.clone(), edge, data, parent);
                }
            }
            RegressionTreeNode::Inner(inner) => {
                let members = node.members();
                let data = NodeData::Decision {
                    question: inner.rule.question(&inner.split_column),
                    factor: group_factor(members.iter().copied()).map(str::to_string),
                    sample_count: inner.diagnostics.sample_count,
                };
                let idx = self.insert_node(inner.id.clone(), edge, data, parent);
                self.add_regression(&inner.left, Some("yes"), Some(idx), label_column);
                self.add_regression(&inner.right, Some("no"), Some(idx), label_column);
            }
        }
    }

    /// Render with box-drawing characters.
    pub fn to_termtree(&self) -> Option<Tree<String>> {
        self.root.map(|root| self.termtree_node(root))
    }

    fn termtree_node(&self, idx: Index) -> Tree<String> {
        let Some(node) = self.get_node(idx) else {
            return Tree::new(String::new());
        };
        let label = match node.edge {
            Some(edge) => format!("{}: {}", edge, node.data),
            None => node.data.to_string(),
        };
        let mut tree = Tree::new(label);
        for &child in &node.children {
            tree.leaves.push(self.termtree_node(child));
        }
        tree
    }

    fn nested(&self, idx: Index) -> Option<NestedNode<'_>> {
        let node = self.get_node(idx)?;
        Some(NestedNode {
            id: &node.id,
            edge: node.edge,
            data: &node.data,
            children: node
                .children
                .iter()
                .filter_map(|&child| self.nested(child))
                .collect(),
        })
    }
}

fn option_data(
    record: &ScoredRecord,
    label_column: Option<&str>,
    fallback: &str,
    predicted_score: Option<f64>,
) -> NodeData {
    let label = label_column
        .map(|c| record.get(c))
        .filter(|v| !v.is_absent())
        .map(|v| v.to_string())
        .unwrap_or_else(|| fallback.to_string());
    NodeData::Choice {
        label,
        score: record.score,
        top_factor: record.top_factor.clone(),
        predicted_score,
    }
}

#[derive(serde::Serialize)]
struct NestedNode<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge: Option<&'static str>,
    #[serde(flatten)]
    data: &'a NodeData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NestedNode<'a>>,
}

/// Serialises as a nested structure rooted at the root node (or `null`).
impl Serialize for TreeArena {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root
            .and_then(|root| self.nested(root))
            .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Pre,
    Post,
}

/// Depth-first walk over a [`TreeArena`], yielding each node with its index.
pub struct Walk<'a> {
    tree: &'a TreeArena,
    order: Order,
    /// Nodes still to visit; `true` once a node's children have been queued.
    pending: Vec<(Index, bool)>,
}

impl<'a> Walk<'a> {
    fn new(tree: &'a TreeArena, order: Order) -> Self {
        Self {
            tree,
            order,
            pending: tree.root.map(|r| (r, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, expanded)) = self.pending.pop() {
            let Some(node) = self.tree.arena.get(idx) else {
                continue;
            };
            if expanded {
                return Some((idx, node));
            }
            if self.order == Order::Post {
                self.pending.push((idx, true));
            }
            // reversed so the leftmost child is popped first
            self.pending
                .extend(node.children.iter().rev().map(|&child| (child, false)));
            if self.order == Order::Pre {
                return Some((idx, node));
            }
        }
        None
    }
}
