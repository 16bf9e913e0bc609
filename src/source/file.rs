//! File-based snapshot source.
//!
//! Reads a captured monitor-data payload from disk on every fetch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{MonitorSnapshot, SnapshotSource};
use crate::error::FetchError;

/// A source that reads a snapshot from a JSON file.
///
/// Useful for replaying a saved `/api/monitor_data` response without a
/// running server. The file is re-read on each fetch, so editing it while
/// the dashboard runs shows up on the next tick.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self) -> Result<MonitorSnapshot, FetchError> {
        let content = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
