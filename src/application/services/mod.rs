//! Application services
//!
//! Concrete service implementations that move data across the I/O boundary.
//! Services depend on the FileSystem trait but are themselves concrete
//! structs, not traits.

mod dataset;
mod export;

pub use dataset::{parse_dataset, DatasetService};
pub use export::{to_json, ExportService};
