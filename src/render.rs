//! Rendering snapshots into the dashboard document.
//!
//! Every write is guarded by an element lookup: a slot missing from the
//! document is skipped without error and the remaining slots still render.

use crate::document::{ids, Document, Element, Fragment, Node, STATUS_CARD_CLASS};
use crate::source::{MonitorSnapshot, StatusClass};

/// Badge text shown when a fetch fails.
pub const CONNECTION_ERROR_TEXT: &str = "Connection error...";

/// Icon shown in the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Ok,
    Warning,
    Danger,
    Offline,
}

impl StatusIcon {
    /// Pick the icon for a status token.
    ///
    /// Only the warning and danger tokens are special; anything else,
    /// including unknown tokens, gets the default icon.
    pub fn for_class(class: &StatusClass) -> Self {
        match class {
            StatusClass::Warning => StatusIcon::Warning,
            StatusClass::Danger => StatusIcon::Danger,
            StatusClass::Good | StatusClass::Other(_) => StatusIcon::Ok,
        }
    }

    /// Icon class used as the marker in the document.
    pub fn class_name(&self) -> &'static str {
        match self {
            StatusIcon::Ok => "fa-check-circle",
            StatusIcon::Warning => "fa-exclamation-triangle",
            StatusIcon::Danger => "fa-radiation-alt",
            StatusIcon::Offline => "fa-wifi",
        }
    }

    /// Resolve an icon marker back to an icon.
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "fa-check-circle" => Some(StatusIcon::Ok),
            "fa-exclamation-triangle" => Some(StatusIcon::Warning),
            "fa-radiation-alt" => Some(StatusIcon::Danger),
            "fa-wifi" => Some(StatusIcon::Offline),
            _ => None,
        }
    }

    /// Returns a short symbol for terminal display.
    pub fn symbol(&self) -> &'static str {
        match self {
            StatusIcon::Ok => "✔",
            StatusIcon::Warning => "▲",
            StatusIcon::Danger => "☢",
            StatusIcon::Offline => "⚠",
        }
    }
}

/// Visual severity of the status badge, read back from its class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Good,
    Warning,
    Danger,
}

impl Severity {
    pub fn of(element: &Element) -> Self {
        if element.has_class(StatusClass::DANGER) {
            Severity::Danger
        } else if element.has_class(StatusClass::WARNING) {
            Severity::Warning
        } else {
            Severity::Good
        }
    }
}

/// Set an element's text content. Does nothing if the element is missing.
pub fn update_text(document: &mut Document, id: &str, text: &str) {
    if let Some(element) = document.get_element_by_id_mut(id) {
        element.set_text_content(text);
    }
}

/// Render a successfully fetched snapshot.
pub fn render_snapshot(document: &mut Document, snapshot: &MonitorSnapshot) {
    let kpi = &snapshot.kpi;
    update_text(document, ids::KPI_CURRENT, &kpi.current.to_string());
    update_text(document, ids::KPI_MIN, &kpi.min.to_string());
    update_text(document, ids::KPI_MAX, &kpi.max.to_string());
    if let Some(avg) = &kpi.avg {
        update_text(document, ids::KPI_AVG, &avg.to_string());
    }
    update_text(document, ids::LAST_UPDATE, &snapshot.last_update);

    render_status(
        document,
        StatusIcon::for_class(&snapshot.status_class),
        &snapshot.status_text,
        snapshot.status_class.as_str(),
    );

    if let Some(markup) = snapshot.chart_markup() {
        if document.get_element_by_id(ids::CHART_CONTAINER).is_some() {
            let fragment = Fragment::parse_contextual(markup);
            if let Some(chart) = document.get_element_by_id_mut(ids::CHART_CONTAINER) {
                chart.clear();
            }
            document.append_fragment(ids::CHART_CONTAINER, fragment);
        }
    }
}

/// Degrade the status badge after a failed fetch.
///
/// KPI slots and the chart keep whatever the last good snapshot put there.
pub fn render_connection_error(document: &mut Document) {
    render_status(
        document,
        StatusIcon::Offline,
        CONNECTION_ERROR_TEXT,
        StatusClass::DANGER,
    );
}

fn render_status(document: &mut Document, icon: StatusIcon, text: &str, class: &str) {
    let Some(status) = document.get_element_by_id_mut(ids::STATUS_BOX) else {
        return;
    };
    status.clear();
    status.append_child(Node::Icon(icon.class_name().to_string()));
    status.append_child(Node::Text(format!(" {}", text)));
    status.set_class_name(format!("{} {}", STATUS_CARD_CLASS, class));
}
