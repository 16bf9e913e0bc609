use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};

use kpi_dashboard::app::{export_document, write_export};
use kpi_dashboard::logging::{init_logging, LogTarget};
use kpi_dashboard::{
    events, ids, ui, App, DashboardPoller, Document, FileSource, HttpSource, OverlapPolicy,
    Outcome, Settings, SnapshotSource,
};

#[derive(Parser, Debug)]
#[command(name = "kpi-dashboard")]
#[command(about = "Terminal dashboard that polls a monitor-data endpoint")]
struct Args {
    /// Monitor-data endpoint
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Replay a captured JSON payload instead of polling over HTTP
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Request timeout in milliseconds (no timeout by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Start a fetch on every tick even if the previous one is still running
    #[arg(long)]
    allow_overlap: bool,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file while the dashboard is on screen
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch once, print the rendered slots and exit
    #[arg(long, conflicts_with = "export")]
    once: bool,

    /// Fetch once, write the rendered document to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Apply explicit flags on top of file and environment settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.url {
            settings.url = url.clone();
            settings.file = None;
        }
        if let Some(file) = &self.file {
            settings.file = Some(file.clone());
        }
        if let Some(interval) = self.interval {
            settings.interval_ms = interval;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_ms = Some(timeout);
        }
        if self.allow_overlap {
            settings.overlap = OverlapPolicy::Allow;
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = Some(log_file.clone());
        }
    }

    fn interactive(&self) -> bool {
        !self.once && self.export.is_none()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let log_target = match (&settings.log_file, args.interactive()) {
        (_, false) => LogTarget::Stderr,
        (Some(path), true) => LogTarget::File(path.as_path()),
        (None, true) => LogTarget::Off,
    };
    init_logging(log_target)?;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let _guard = rt.enter();

    let poller = DashboardPoller::from_arc(build_source(&settings), Document::dashboard().into_shared())
        .with_interval(settings.interval())
        .with_overlap(settings.overlap);

    if args.once {
        let outcome = rt.block_on(poller.fetch_and_render());
        print_slots(&poller.document().lock());
        if let Outcome::Degraded(err) = outcome {
            bail!("fetch failed: {}", err);
        }
        return Ok(());
    }

    if let Some(export_path) = &args.export {
        let outcome = rt.block_on(poller.fetch_and_render());
        return export_to_file(&poller, &outcome, export_path);
    }

    let handle = poller.start();
    let result = run_tui(App::new(poller));
    rt.block_on(handle.stop());
    result
}

fn build_source(settings: &Settings) -> Arc<dyn SnapshotSource> {
    if let Some(path) = &settings.file {
        return Arc::new(FileSource::new(path));
    }

    let mut source = HttpSource::new(settings.url.clone());
    if let Some(timeout) = settings.timeout() {
        source = source.with_timeout(timeout);
    }
    Arc::new(source)
}

/// Print every slot of the document to stdout.
fn print_slots(document: &Document) {
    for id in ids::DASHBOARD {
        let Some(element) = document.get_element_by_id(id) else {
            continue;
        };
        let mut line = format!("{:<16} {}", id, element.text_content());
        if let Some(icon) = element.icon() {
            line.push_str(&format!(" [{}]", icon));
        }
        if !element.class_name().is_empty() {
            line.push_str(&format!(" ({})", element.class_name()));
        }
        println!("{}", line);
    }
}

/// Export the rendered document and the fetch outcome to a JSON file.
fn export_to_file(poller: &DashboardPoller, outcome: &Outcome, export_path: &Path) -> Result<()> {
    let mut export = export_document(&poller.document().lock());
    export["source"] = serde_json::json!(poller.source_description());
    export["outcome"] = match outcome {
        Outcome::Rendered => serde_json::json!({ "rendered": true }),
        Outcome::Degraded(err) => serde_json::json!({
            "rendered": false,
            "error": err.to_string(),
        }),
    };

    write_export(export_path, &export)
        .with_context(|| format!("failed to write {}", export_path.display()))?;

    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}

/// Run the TUI until the user quits.
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered =
                    ratatui::layout::Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                        .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(9),    // Dashboard
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::dashboard::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // The poller redraws the document in the background, so a short
        // timeout keeps the screen current.
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
