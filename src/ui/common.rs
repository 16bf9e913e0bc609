//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::document::ids;
use crate::poller::PollStatus;
use crate::render::Severity;

/// Render the header bar with the badge severity and the source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let severity = app
        .document()
        .lock()
        .get_element_by_id(ids::STATUS_BOX)
        .map(Severity::of)
        .unwrap_or(Severity::Good);

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(severity)),
        Span::styled("KPI DASHBOARD ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description().to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Text of the status bar when no temporary message is showing.
pub fn status_line(status: &PollStatus, since_success: Option<Duration>) -> String {
    const CONTROLS: &str = "r:refresh e:export ?:help q:quit";

    match (since_success, &status.last_error) {
        (_, Some(err)) => format!(
            " Error: {} | {} ok, {} failed | {}",
            err, status.successes, status.failures, CONTROLS
        ),
        (Some(elapsed), None) => format!(
            " Updated {:.1}s ago | {} ok, {} failed, {} skipped | {}",
            elapsed.as_secs_f64(),
            status.successes,
            status.failures,
            status.skipped,
            CONTROLS
        ),
        (None, None) => format!(" Loading... | {}", CONTROLS),
    }
}

/// Render the status bar at the bottom.
///
/// Shows time since the last good fetch and the poll counters, or the last
/// fetch error. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = app.poll_status();
    let since_success = status.last_success.map(|t| t.elapsed());
    let style = if status.last_error.is_some() {
        Style::default().fg(app.theme.danger)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let paragraph = Paragraph::new(status_line(&status, since_success)).style(style);
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  ?         Toggle this help"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 36u16.min(area.width.saturating_sub(4));
    let help_height = 10u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_loading() {
        let line = status_line(&PollStatus::default(), None);
        assert!(line.starts_with(" Loading..."));
    }

    #[test]
    fn test_status_line_updated() {
        let status = PollStatus {
            successes: 3,
            skipped: 1,
            ..PollStatus::default()
        };
        let line = status_line(&status, Some(Duration::from_millis(2500)));
        assert!(line.contains("Updated 2.5s ago"));
        assert!(line.contains("3 ok, 0 failed, 1 skipped"));
    }

    #[test]
    fn test_status_line_error() {
        let status = PollStatus {
            failures: 2,
            last_error: Some("HTTP error! status: 503".to_string()),
            ..PollStatus::default()
        };
        let line = status_line(&status, None);
        assert!(line.contains("Error: HTTP error! status: 503"));
        assert!(line.contains("0 ok, 2 failed"));
    }
}
