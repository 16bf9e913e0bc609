//! Layered settings.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, `KPI_DASHBOARD_*` environment variables, and finally explicit
//! command-line flags (applied by the binary).
//!
//! ```toml
//! url = "http://sensors.local:5000/api/monitor_data"
//! interval_ms = 5000
//! timeout_ms = 3000
//! overlap = "skip"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};

use crate::poller::{OverlapPolicy, DEFAULT_INTERVAL};
use crate::source::DEFAULT_ENDPOINT;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "KPI_DASHBOARD";

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Monitor-data endpoint.
    pub url: String,
    /// Replay this JSON file instead of polling `url`.
    pub file: Option<PathBuf>,
    /// Time between polls, in milliseconds.
    pub interval_ms: u64,
    /// Per-request timeout, in milliseconds. Unset means no explicit timeout.
    pub timeout_ms: Option<u64>,
    /// Behaviour when a tick fires while a fetch is still running.
    pub overlap: OverlapPolicy,
    /// Where to write logs while the TUI owns the terminal.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            file: None,
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            timeout_ms: None,
            overlap: OverlapPolicy::default(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], but reads environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("failed to load settings")?
            .try_deserialize()
            .context("invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the poller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        if self.timeout_ms == Some(0) {
            bail!("timeout_ms must be greater than zero");
        }
        if self.file.is_none() && self.url.trim().is_empty() {
            bail!("either url or file must be set");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
