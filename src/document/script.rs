//! Script execution hosts.
//!
//! Inserting a chart fragment runs its scripts through a [`ScriptHost`]. This
//! is the one place where payload-supplied code is handed to something that
//! can act on it, so the chart payload must come from a trusted, same-origin
//! producer.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Script;

/// Executes scripts that arrive inside inserted fragments.
pub trait ScriptHost: Send + Debug {
    /// Run one script. Called once per script, in document order.
    fn execute(&mut self, script: &Script);
}

/// Default host for the terminal front end.
///
/// A terminal has no script engine, so execution is recorded in the log
/// and otherwise a no-op.
#[derive(Debug, Default)]
pub struct TracingScriptHost;

impl ScriptHost for TracingScriptHost {
    fn execute(&mut self, script: &Script) {
        tracing::debug!(
            src = script.src().unwrap_or("inline"),
            bytes = script.body().len(),
            "executing chart script"
        );
    }
}

/// Host that keeps every executed script.
///
/// Clones share the same record, so a test can keep one handle and give
/// the other to a document.
#[derive(Debug, Clone, Default)]
pub struct RecordingScriptHost {
    executed: Arc<Mutex<Vec<Script>>>,
}

impl RecordingScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts executed so far, oldest first.
    pub fn executed(&self) -> Vec<Script> {
        self.executed.lock().clone()
    }

    /// Inline bodies of executed scripts, oldest first.
    pub fn bodies(&self) -> Vec<String> {
        self.executed.lock().iter().map(|s| s.body().to_string()).collect()
    }
}

impl ScriptHost for RecordingScriptHost {
    fn execute(&mut self, script: &Script) {
        self.executed.lock().push(script.clone());
    }
}
