//! Application state for the terminal front end.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::document::{Document, Node, SharedDocument};
use crate::poller::{DashboardPoller, PollStatus};
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    poller: DashboardPoller,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around a poller.
    ///
    /// The poller is not started here; the caller owns its lifecycle.
    pub fn new(poller: DashboardPoller) -> Self {
        Self::with_theme(poller, Theme::auto_detect())
    }

    pub fn with_theme(poller: DashboardPoller, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            poller,
            theme,
            status_message: None,
        }
    }

    /// The document being drawn.
    pub fn document(&self) -> &SharedDocument {
        self.poller.document()
    }

    /// Returns a description of the snapshot source.
    pub fn source_description(&self) -> &str {
        self.poller.source_description()
    }

    pub fn poll_status(&self) -> PollStatus {
        self.poller.status()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Fetch right away instead of waiting for the next tick.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn refresh(&mut self) {
        if self.poller.refresh() {
            self.set_status_message("Refreshing...".to_string());
        } else {
            self.set_status_message("A fetch is already in flight".to_string());
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current document to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let export = {
            let document = self.document().lock();
            export_document(&document)
        };
        write_export(path, &export)
    }
}

/// Serialize the document's visible state.
///
/// Each element is exported with its class list, icon, text and the
/// number of scripts it holds.
pub fn export_document(document: &Document) -> serde_json::Value {
    let elements: serde_json::Map<String, serde_json::Value> = document
        .elements()
        .map(|element| {
            let scripts = element
                .children()
                .iter()
                .filter(|node| matches!(node, Node::Script(_)))
                .count();
            (
                element.id().to_string(),
                serde_json::json!({
                    "class": element.class_name(),
                    "icon": element.icon(),
                    "text": element.text_content(),
                    "scripts": scripts,
                }),
            )
        })
        .collect();

    serde_json::json!({
        "elements": elements,
        "scripts_executed": document.scripts_executed(),
    })
}

/// Write an export as pretty JSON.
pub fn write_export(path: &Path, export: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(export)?;
    std::fs::write(path, json)?;
    Ok(())
}
