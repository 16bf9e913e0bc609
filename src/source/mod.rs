//! Snapshot source abstraction.
//!
//! The poller does not care where a snapshot comes from. The production
//! source is [`HttpSource`], which polls the monitor-data endpoint;
//! [`FileSource`] replays a captured payload from disk.

mod file;
mod http;
mod snapshot;

pub use file::FileSource;
pub use http::{HttpSource, DEFAULT_ENDPOINT};
pub use snapshot::{DisplayValue, Kpi, MonitorSnapshot, StatusClass};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait for fetching monitor snapshots.
///
/// Each call performs one complete fetch. Implementations must not cache:
/// the poller expects a fresh snapshot (or a fresh failure) every time.
///
/// # Example
///
/// ```no_run
/// use kpi_dashboard::{HttpSource, SnapshotSource};
///
/// # tokio_test::block_on(async {
/// let source = HttpSource::new("http://127.0.0.1:5000/api/monitor_data");
/// match source.fetch().await {
///     Ok(snapshot) => println!("current: {}", snapshot.kpi.current),
///     Err(e) => eprintln!("fetch failed: {}", e),
/// }
/// # });
/// ```
#[async_trait]
pub trait SnapshotSource: Send + Sync + Debug {
    /// Fetch and decode the latest snapshot.
    async fn fetch(&self) -> Result<MonitorSnapshot, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
