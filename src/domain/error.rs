//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::ColumnKind;

/// Domain errors represent invalid engine inputs.
///
/// Degenerate data (empty filters, zero ranges, empty trees) is never an error;
/// only constructors with invalid parameters produce these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("tradeoff weight for '{column}' must be finite and >= 0, got {weight}")]
    InvalidWeight { column: String, weight: f64 },

    #[error("tradeoff column '{column}' is {kind}, only numeric columns can be traded off")]
    NonNumericTradeoff { column: String, kind: ColumnKind },

    #[error("invalid tree options: {0}")]
    InvalidBuildOptions(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
