//! Application layer: configuration resolution, pipeline and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod options;
pub mod pipeline;
pub mod resolve;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::PathContext;
pub use options::{EngineConfig, TreeSettings};
pub use pipeline::{run_pipeline, Snapshot};
pub use resolve::{resolve, DroppedReference, EffectiveConfig};
