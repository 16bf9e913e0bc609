//! # kpi-dashboard
//!
//! A polling dashboard client for a single KPI feed.
//!
//! On a fixed interval the [`DashboardPoller`] fetches a [`MonitorSnapshot`]
//! from `/api/monitor_data` and renders it into a [`Document`]: the KPI text
//! slots, a status badge (icon, text, severity class) and an embedded chart
//! fragment. Failed fetches degrade the badge to a connection error and leave
//! everything else as the last good snapshot left it. A terminal UI draws the
//! document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │ source  │───▶│  poller  │───▶│  render  │───▶│document │  │
//! │  │ (fetch) │    │ (timer)  │    │ (slots)  │    │ (state) │  │
//! │  └─────────┘    └──────────┘    └──────────┘    └────┬────┘  │
//! │   HttpSource                                         │       │
//! │   FileSource                                         ▼       │
//! │                               ┌─────────┐    ┌──────────┐    │
//! │                               │  app    │───▶│   ui     │    │
//! │                               │ (state) │    │(ratatui) │    │
//! │                               └─────────┘    └──────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`SnapshotSource`] trait and its HTTP and file
//!   implementations, plus the wire types
//! - **[`document`]**: elements addressed by id, fragment parsing and the
//!   [`ScriptHost`] that runs embedded chart scripts
//! - **[`render`]**: how a snapshot or a failure maps onto the document
//! - **[`poller`]**: the refresh loop and its overlap policy
//! - **[`config`]**, **[`logging`]**: settings and tracing setup for the binary
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal front end
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the default endpoint every 5 seconds
//! kpi-dashboard
//!
//! # Poll another host, every 2 seconds, with a 1 second request timeout
//! kpi-dashboard --url http://sensors.local:5000/api/monitor_data -i 2000 --timeout 1000
//!
//! # Render a captured payload once and print the slots
//! kpi-dashboard --file snapshot.json --once
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use kpi_dashboard::{DashboardPoller, Document, HttpSource};
//!
//! # tokio_test::block_on(async {
//! let document = Document::dashboard().into_shared();
//! let poller = DashboardPoller::new(HttpSource::default(), document.clone());
//!
//! let handle = poller.start();
//! // ... draw `document` somewhere ...
//! handle.stop().await;
//! # });
//! ```
//!
//! ### Rendering a single fetch
//!
//! ```
//! use kpi_dashboard::{ids, DashboardPoller, Document, FileSource};
//!
//! # tokio_test::block_on(async {
//! let document = Document::dashboard().into_shared();
//! let poller = DashboardPoller::new(FileSource::new("missing.json"), document.clone());
//!
//! let outcome = poller.fetch_and_render().await;
//! assert!(!outcome.is_rendered());
//!
//! let doc = document.lock();
//! let status = doc.get_element_by_id(ids::STATUS_BOX).unwrap();
//! assert_eq!(status.class_name(), "status-card status-danger");
//! # });
//! ```

pub mod app;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod logging;
pub mod poller;
pub mod render;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use document::{
    ids, Document, Element, Fragment, Node, RecordingScriptHost, Script, ScriptHost,
    SharedDocument, TracingScriptHost,
};
pub use error::FetchError;
pub use poller::{DashboardPoller, OverlapPolicy, Outcome, PollStatus, PollerHandle};
pub use render::{Severity, StatusIcon};
pub use source::{
    DisplayValue, FileSource, HttpSource, Kpi, MonitorSnapshot, SnapshotSource, StatusClass,
};
