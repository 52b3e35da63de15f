//! Domain layer: the filtering, scoring and tree-construction engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod balanced;
pub mod classifier;
pub mod constraint;
pub mod entities;
pub mod error;
pub mod explain;
pub mod regression;
pub mod scoring;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use balanced::{build_exploration_tree, ExplorationTreeNode};
pub use classifier::{classify_column, ColumnInfo, Schema};
pub use constraint::{Constraint, ConstraintSet, FilterDiagnostics};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use explain::most_influential;
pub use regression::{build_regression_tree, BuildOptions, Feature, RegressionTreeNode};
pub use scoring::{score_records, Contribution, Direction, ScoredRecord, Tradeoff};
