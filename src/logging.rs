//! Tracing subscriber setup.
//!
//! The binary logs to stderr in its one-shot modes. While the terminal UI owns
//! the screen, logs go to a file or nowhere.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "kpi_dashboard=info";

/// Where log output should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Standard error. Only safe when no TUI owns the terminal.
    Stderr,
    /// Append to a file.
    File(&'a Path),
    /// Discard everything.
    Off,
}

/// Initialize logging.
///
/// `RUST_LOG` refines the filter; without it, info-level events from this
/// crate are emitted.
pub fn init_logging(target: LogTarget<'_>) -> Result<()> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    };

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .with(filter())
                .try_init()
                .context("failed to install log subscriber")?;
            Ok(())
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::sync::Mutex::new(file))
                        .with_ansi(false),
                )
                .with(filter())
                .try_init()
                .context("failed to install log subscriber")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_off() {
        // Installing a global subscriber can only happen once per process,
        // so only the no-op target is exercised here.
        assert!(init_logging(LogTarget::Off).is_ok());
    }

    #[test]
    fn test_unwritable_log_file() {
        let err = init_logging(LogTarget::File(Path::new("/nonexistent/dir/dashboard.log")))
            .unwrap_err();
        assert!(err.to_string().contains("failed to open log file"));
    }
}
