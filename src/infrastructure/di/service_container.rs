//! Wiring of settings and services for one CLI invocation.

use std::sync::Arc;

use crate::application::services::{DatasetService, ExportService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Settings plus every service a command may need, sharing one filesystem.
pub struct ServiceContainer {
    pub settings: Arc<Settings>,
    pub fs: Arc<dyn FileSystem>,
    /// Reads option tables.
    pub datasets: DatasetService,
    /// Writes snapshots for `run --export`.
    pub export: ExportService,
}

impl ServiceContainer {
    /// Services backed by the real filesystem.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Services backed by `fs`, e.g. a [`MemoryFileSystem`](crate::infrastructure::traits::MemoryFileSystem).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            datasets: DatasetService::new(Arc::clone(&fs)),
            export: ExportService::new(Arc::clone(&fs)),
            fs,
        }
    }
}
