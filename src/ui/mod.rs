//! Terminal UI rendering using ratatui.
//!
//! The UI is a read-only view of the dashboard [`Document`](crate::document::Document):
//! every frame locks the document briefly, reads the slots it knows about and
//! draws them.
//!
//! ## Submodules
//!
//! - [`dashboard`]: Status badge, KPI boxes and chart panel
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Status badge                         │
//! ├──────────────────────────────────────┤
//! │ KPI boxes                            │
//! ├──────────────────────────────────────┤
//! │ Chart (dashboard::render)            │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod dashboard;
pub mod theme;

pub use theme::Theme;
