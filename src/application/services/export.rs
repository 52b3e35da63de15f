//! Snapshot export service
//!
//! Writes pipeline snapshots as pretty-printed JSON for external renderers.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::pipeline::Snapshot;
use crate::application::{ApplicationResult, PathContext};
use crate::infrastructure::traits::FileSystem;

/// Service for exporting snapshots to disk.
pub struct ExportService {
    fs: Arc<dyn FileSystem>,
}

impl ExportService {
    /// Create a new export service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Write `snapshot` to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, snapshot))]
    pub fn write_json(&self, snapshot: &Snapshot, path: &Path) -> ApplicationResult<()> {
        let content = to_json(snapshot).with_path_context("serialize snapshot", path)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create export directory", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write export", path)?;
        info!(path = %path.display(), bytes = content.len(), "exported snapshot");
        Ok(())
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json(snapshot: &Snapshot) -> serde_json::Result<String> {
    let mut content = serde_json::to_string_pretty(snapshot)?;
    content.push('\n');
    Ok(content)
}
