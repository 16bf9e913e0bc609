//! Dashboard view rendering.
//!
//! Draws the status badge, one box per KPI slot, and the chart panel.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::document::{ids, Document};
use crate::render::{Severity, StatusIcon};
use crate::ui::Theme;

/// KPI boxes, left to right: (title, slot id).
const KPI_BOXES: &[(&str, &str)] = &[
    ("Current", ids::KPI_CURRENT),
    ("Min", ids::KPI_MIN),
    ("Max", ids::KPI_MAX),
    ("Avg", ids::KPI_AVG),
    ("Last update", ids::LAST_UPDATE),
];

/// What one frame draws, copied out of the document so the lock is not held
/// while rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Badge icon, if the badge has been rendered at least once.
    pub icon: Option<StatusIcon>,
    pub status_text: String,
    pub severity: Severity,
    /// `None` for KPI slots missing from the document.
    pub kpis: Vec<(&'static str, Option<String>)>,
    /// `None` if the chart container is missing.
    pub chart: Option<String>,
    pub chart_scripts: usize,
    pub scripts_executed: u64,
}

impl DashboardView {
    pub fn from_document(document: &Document) -> Self {
        let status = document.get_element_by_id(ids::STATUS_BOX);
        let chart = document.get_element_by_id(ids::CHART_CONTAINER);

        Self {
            icon: status
                .and_then(|s| s.icon())
                .and_then(StatusIcon::from_class_name),
            status_text: status
                .map(|s| s.text_content().trim_start().to_string())
                .unwrap_or_default(),
            severity: status.map(Severity::of).unwrap_or(Severity::Good),
            kpis: KPI_BOXES
                .iter()
                .map(|(title, id)| {
                    let text = document.get_element_by_id(id).map(|e| e.text_content());
                    (*title, text)
                })
                .collect(),
            chart: chart.map(|c| c.text_content()),
            chart_scripts: chart.map(|c| c.scripts().count()).unwrap_or(0),
            scripts_executed: document.scripts_executed(),
        }
    }
}

/// Render the dashboard into `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = DashboardView::from_document(&app.document().lock());

    let chunks = Layout::vertical([
        Constraint::Length(3), // Status badge
        Constraint::Length(3), // KPI boxes
        Constraint::Min(3),    // Chart
    ])
    .split(area);

    render_status_badge(frame, &view, &app.theme, chunks[0]);
    render_kpis(frame, &view, &app.theme, chunks[1]);
    render_chart(frame, &view, &app.theme, chunks[2]);
}

fn render_status_badge(frame: &mut Frame, view: &DashboardView, theme: &Theme, area: Rect) {
    let style = theme.status_style(view.severity);

    let line = match view.icon {
        Some(icon) => Line::from(vec![
            Span::styled(format!(" {} ", icon.symbol()), style),
            Span::styled(view.status_text.clone(), style),
        ]),
        None => Line::from(Span::styled(" Waiting for first reading...", theme.muted)),
    };

    let block = Block::default()
        .title(" Status ")
        .title_style(theme.header)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.severity_color(view.severity)));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_kpis(frame: &mut Frame, view: &DashboardView, theme: &Theme, area: Rect) {
    let constraints: Vec<Constraint> = view
        .kpis
        .iter()
        .map(|_| Constraint::Ratio(1, view.kpis.len() as u32))
        .collect();
    let cells = Layout::horizontal(constraints).split(area);

    for ((title, value), cell) in view.kpis.iter().zip(cells.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));

        let text = match value {
            Some(text) => Span::styled(text.clone(), theme.value),
            None => Span::styled("n/a", theme.muted),
        };

        let paragraph = Paragraph::new(Line::from(text))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, *cell);
    }
}

fn render_chart(frame: &mut Frame, view: &DashboardView, theme: &Theme, area: Rect) {
    let title = format!(
        " Chart │ scripts: {} here, {} executed ",
        view.chart_scripts, view.scripts_executed
    );
    let block = Block::default()
        .title(title)
        .title_style(theme.header)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    let lines: Vec<Line> = match &view.chart {
        None => vec![Line::from(Span::styled("No chart container", theme.muted))],
        Some(text) if text.trim().is_empty() => {
            vec![Line::from(Span::styled("No chart", theme.muted))]
        }
        Some(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Line::from(line.to_string()))
            .collect(),
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
