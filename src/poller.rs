//! The polling loop.
//!
//! [`DashboardPoller`] fetches a snapshot from its [`SnapshotSource`] and
//! renders it into a [`SharedDocument`]. [`DashboardPoller::start`] runs
//! that once immediately and then on a fixed interval until the returned
//! [`PollerHandle`] is stopped or dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::document::SharedDocument;
use crate::error::FetchError;
use crate::render;
use crate::source::SnapshotSource;

/// Default time between polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// What happens when a tick fires while an earlier fetch is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Keep at most one fetch in flight; ticks that find one running are skipped.
    #[default]
    Skip,
    /// Start a fetch on every tick. Responses race and the last one to
    /// complete is what stays on screen.
    Allow,
}

/// Result of a single fetch-and-render pass.
#[derive(Debug)]
pub enum Outcome {
    /// The snapshot was rendered.
    Rendered,
    /// The fetch failed and the status badge shows the connection error.
    Degraded(FetchError),
}

impl Outcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Outcome::Rendered)
    }
}

/// Running counters for the status bar.
#[derive(Debug, Clone, Default)]
pub struct PollStatus {
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub last_success: Option<Instant>,
    pub last_error: Option<String>,
}

/// Fetches snapshots and renders them into a document.
///
/// Clones share the source, the document, the in-flight guard and the
/// status counters.
#[derive(Debug, Clone)]
pub struct DashboardPoller {
    source: Arc<dyn SnapshotSource>,
    document: SharedDocument,
    interval: Duration,
    overlap: OverlapPolicy,
    in_flight: Arc<Semaphore>,
    status: Arc<Mutex<PollStatus>>,
}

impl DashboardPoller {
    /// Create a poller with the default interval and overlap policy.
    pub fn new(source: impl SnapshotSource + 'static, document: SharedDocument) -> Self {
        Self::from_arc(Arc::new(source), document)
    }

    /// Create a poller around an already shared source.
    pub fn from_arc(source: Arc<dyn SnapshotSource>, document: SharedDocument) -> Self {
        Self {
            source,
            document,
            interval: DEFAULT_INTERVAL,
            overlap: OverlapPolicy::default(),
            in_flight: Arc::new(Semaphore::new(1)),
            status: Arc::new(Mutex::new(PollStatus::default())),
        }
    }

    /// Set the poll interval. Zero is raised to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn overlap(&self) -> OverlapPolicy {
        self.overlap
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Snapshot of the running counters.
    pub fn status(&self) -> PollStatus {
        self.status.lock().clone()
    }

    /// Set the text of one element. Does nothing if the element is missing.
    pub fn update_text(&self, id: &str, text: &str) {
        render::update_text(&mut self.document.lock(), id, text);
    }

    /// Fetch one snapshot and render it.
    ///
    /// Never fails: any fetch error is logged and turned into the
    /// connection-error badge. The document lock is only taken once the
    /// fetch has finished.
    pub async fn fetch_and_render(&self) -> Outcome {
        let result = self.source.fetch().await;

        match result {
            Ok(snapshot) => {
                render::render_snapshot(&mut self.document.lock(), &snapshot);

                let mut status = self.status.lock();
                status.successes += 1;
                status.last_success = Some(Instant::now());
                status.last_error = None;
                Outcome::Rendered
            }
            Err(err) => {
                tracing::error!(
                    source = self.source.description(),
                    error = %err,
                    "failed to fetch monitor data"
                );
                render::render_connection_error(&mut self.document.lock());

                let mut status = self.status.lock();
                status.failures += 1;
                status.last_error = Some(err.to_string());
                Outcome::Degraded(err)
            }
        }
    }

    /// Launch a fetch now, subject to the overlap policy.
    ///
    /// Returns false if the tick was skipped because a fetch is already in
    /// flight. Must be called from within a Tokio runtime.
    pub fn refresh(&self) -> bool {
        match self.overlap {
            OverlapPolicy::Allow => {
                let poller = self.clone();
                tokio::spawn(async move {
                    poller.fetch_and_render().await;
                });
                true
            }
            OverlapPolicy::Skip => match self.in_flight.clone().try_acquire_owned() {
                Ok(permit) => {
                    let poller = self.clone();
                    tokio::spawn(async move {
                        poller.fetch_and_render().await;
                        drop(permit);
                    });
                    true
                }
                Err(_) => {
                    tracing::debug!("previous fetch still in flight, skipping tick");
                    self.status.lock().skipped += 1;
                    false
                }
            },
        }
    }

    /// Start polling: one fetch right away, then one per interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let poller = self.clone();

        tracing::info!(
            source = poller.source_description(),
            interval_ms = poller.interval.as_millis() as u64,
            overlap = ?poller.overlap,
            "dashboard poller started"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // Either an explicit stop or the handle being dropped.
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        tracing::debug!("poll tick");
                        poller.refresh();
                    }
                }
            }

            tracing::info!("dashboard poller stopped");
        });

        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running polling loop.
///
/// Dropping the handle also ends the loop. Fetches already in flight are not
/// cancelled and may still render once.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop scheduling new fetches and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::document::{ids, Document, RecordingScriptHost};
    use crate::source::MonitorSnapshot;

    fn snapshot_json(current: i64, class: &str) -> String {
        format!(
            r#"{{"kpi":{{"current":{},"min":10,"max":99}},"last_update":"12:00","status_class":"{}","status_text":"reading {}","graph_html":""}}"#,
            current, class, current
        )
    }

    fn snapshot(current: i64, class: &str) -> MonitorSnapshot {
        serde_json::from_str(&snapshot_json(current, class)).unwrap()
    }

    /// Source that replays a scripted list of (delay, result) pairs.
    ///
    /// Once the script runs out, every fetch fails with a 503.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<(Duration, Result<MonitorSnapshot, FetchError>)>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn push(self, delay: Duration, result: Result<MonitorSnapshot, FetchError>) -> Self {
            self.script.lock().push_back((delay, result));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<MonitorSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().pop_front();
            match next {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                None => Err(FetchError::Status(503)),
            }
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    /// Source whose every fetch takes the same time and succeeds.
    #[derive(Debug)]
    struct SlowSource {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SnapshotSource for SlowSource {
        async fn fetch(&self) -> Result<MonitorSnapshot, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as i64;
            tokio::time::sleep(self.delay).await;
            Ok(snapshot(n, "status-good"))
        }

        fn description(&self) -> &str {
            "slow"
        }
    }

    fn text(document: &SharedDocument, id: &str) -> String {
        document.lock().get_element_by_id(id).unwrap().text_content()
    }

    #[tokio::test]
    async fn test_fetch_and_render_success() {
        let document = Document::dashboard().into_shared();
        let source = ScriptedSource::default().push(Duration::ZERO, Ok(snapshot(42, "status-good")));
        let poller = DashboardPoller::new(source, document.clone());

        let outcome = poller.fetch_and_render().await;
        assert!(outcome.is_rendered());

        assert_eq!(text(&document, ids::KPI_CURRENT), "42");
        let doc = document.lock();
        let status = doc.get_element_by_id(ids::STATUS_BOX).unwrap();
        assert_eq!(status.class_name(), "status-card status-good");
        assert_eq!(status.text_content(), " reading 42");
        drop(doc);

        let counters = poller.status();
        assert_eq!(counters.successes, 1);
        assert!(counters.last_success.is_some());
        assert!(counters.last_error.is_none());
    }

    #[tokio::test]
    async fn test_http_status_failure_degrades_badge_only() {
        let document = Document::dashboard().into_shared();
        let source = ScriptedSource::default()
            .push(Duration::ZERO, Ok(snapshot(42, "status-warning")))
            .push(Duration::ZERO, Err(FetchError::Status(500)));
        let poller = DashboardPoller::new(source, document.clone());

        assert!(poller.fetch_and_render().await.is_rendered());
        let outcome = poller.fetch_and_render().await;
        assert!(matches!(outcome, Outcome::Degraded(FetchError::Status(500))));

        assert_eq!(text(&document, ids::KPI_CURRENT), "42");
        assert_eq!(text(&document, ids::KPI_MIN), "10");
        let doc = document.lock();
        let status = doc.get_element_by_id(ids::STATUS_BOX).unwrap();
        assert_eq!(status.icon(), Some("fa-wifi"));
        assert_eq!(
            status.text_content(),
            format!(" {}", render::CONNECTION_ERROR_TEXT)
        );
        assert_eq!(status.class_name(), "status-card status-danger");
        drop(doc);

        let counters = poller.status();
        assert_eq!(counters.failures, 1);
        assert_eq!(counters.last_error.as_deref(), Some("HTTP error! status: 500"));
    }

    #[tokio::test]
    async fn test_decode_failure_matches_status_failure() {
        let decode_err = serde_json::from_str::<MonitorSnapshot>("{\"kpi\":").unwrap_err();

        let by_status = Document::dashboard().into_shared();
        let by_decode = Document::dashboard().into_shared();

        DashboardPoller::new(
            ScriptedSource::default().push(Duration::ZERO, Err(FetchError::Status(404))),
            by_status.clone(),
        )
        .fetch_and_render()
        .await;
        DashboardPoller::new(
            ScriptedSource::default().push(Duration::ZERO, Err(FetchError::Decode(decode_err))),
            by_decode.clone(),
        )
        .fetch_and_render()
        .await;

        let a = by_status.lock();
        let b = by_decode.lock();
        assert_eq!(
            a.get_element_by_id(ids::STATUS_BOX),
            b.get_element_by_id(ids::STATUS_BOX)
        );
    }

    #[tokio::test]
    async fn test_failure_without_status_box_is_silent() {
        let mut document = Document::dashboard();
        document.remove_element(ids::STATUS_BOX);
        let document = document.into_shared();

        let poller = DashboardPoller::new(ScriptedSource::default(), document.clone());
        let outcome = poller.fetch_and_render().await;
        assert!(!outcome.is_rendered());
        assert!(document.lock().get_element_by_id(ids::STATUS_BOX).is_none());
    }

    #[tokio::test]
    async fn test_chart_scripts_execute_after_insertion() {
        let host = RecordingScriptHost::new();
        let mut document = Document::with_script_host(host.clone());
        document.install_dashboard_slots();
        let document = document.into_shared();

        let mut snap = snapshot(42, "status-good");
        snap.graph_html = Some(
            r#"<div id="plot"></div><script type="text/javascript">Plotly.newPlot("plot")</script>"#
                .to_string(),
        );
        let poller = DashboardPoller::new(
            ScriptedSource::default().push(Duration::ZERO, Ok(snap)),
            document.clone(),
        );
        poller.fetch_and_render().await;

        assert_eq!(host.bodies(), vec![r#"Plotly.newPlot("plot")"#]);
        assert_eq!(document.lock().scripts_executed(), 1);
    }

    #[tokio::test]
    async fn test_update_text_through_poller() {
        let document = Document::dashboard().into_shared();
        let poller = DashboardPoller::new(ScriptedSource::default(), document.clone());

        poller.update_text(ids::LAST_UPDATE, "13:37");
        poller.update_text("no-such-slot", "ignored");
        assert_eq!(text(&document, ids::LAST_UPDATE), "13:37");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_immediately_then_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = SlowSource {
            delay: Duration::from_millis(10),
            calls: calls.clone(),
        };
        let document = Document::dashboard().into_shared();
        let poller = DashboardPoller::new(source, document.clone());
        assert_eq!(poller.interval(), DEFAULT_INTERVAL);

        let handle = poller.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(text(&document, ids::KPI_CURRENT), "0");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(text(&document, ids::KPI_CURRENT), "1");

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = SlowSource {
            delay: Duration::ZERO,
            calls: calls.clone(),
        };
        let poller = DashboardPoller::new(source, Document::dashboard().into_shared())
            .with_interval(Duration::from_secs(1));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = SlowSource {
            delay: Duration::ZERO,
            calls: calls.clone(),
        };
        let poller = DashboardPoller::new(source, Document::dashboard().into_shared())
            .with_interval(Duration::from_secs(1));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_policy_keeps_one_fetch_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = SlowSource {
            delay: Duration::from_secs(12),
            calls: calls.clone(),
        };
        let poller = DashboardPoller::new(source, Document::dashboard().into_shared())
            .with_overlap(OverlapPolicy::Skip);

        let handle = poller.start();
        // Ticks at 0, 5, 10, 15, 20: the fetch started at 0 finishes at 12,
        // so 5 and 10 are skipped, 15 starts the second fetch and 20 is skipped.
        tokio::time::sleep(Duration::from_millis(21_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.status().skipped, 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_allow_policy_overlaps_fetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = SlowSource {
            delay: Duration::from_secs(12),
            calls: calls.clone(),
        };
        let poller = DashboardPoller::new(source, Document::dashboard().into_shared())
            .with_overlap(OverlapPolicy::Allow);

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(21_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(poller.status().skipped, 0);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_allow_policy_last_completed_response_wins() {
        let source = ScriptedSource::default()
            .push(Duration::from_secs(8), Ok(snapshot(1, "status-good")))
            .push(Duration::from_secs(1), Ok(snapshot(2, "status-danger")));
        let document = Document::dashboard().into_shared();
        let poller = DashboardPoller::new(source, document.clone())
            .with_overlap(OverlapPolicy::Allow);

        let handle = poller.start();

        // Second request (issued at 5s) lands at 6s.
        tokio::time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(text(&document, ids::KPI_CURRENT), "2");

        // First request (issued at 0s) lands at 8s and overwrites it.
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(text(&document, ids::KPI_CURRENT), "1");
        let doc = document.lock();
        let status = doc.get_element_by_id(ids::STATUS_BOX).unwrap();
        assert_eq!(status.class_name(), "status-card status-good");
        drop(doc);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_timer() {
        let source = Arc::new(
            ScriptedSource::default()
                .push(Duration::ZERO, Err(FetchError::Network("refused".to_string())))
                .push(Duration::ZERO, Err(FetchError::Status(502)))
                .push(Duration::ZERO, Ok(snapshot(7, "status-good"))),
        );
        let document = Document::dashboard().into_shared();
        let poller = DashboardPoller::from_arc(source.clone(), document.clone())
            .with_interval(Duration::from_secs(1));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(text(&document, ids::KPI_CURRENT), "7");
        assert_eq!(source.calls(), 3);
        let counters = poller.status();
        assert_eq!(counters.failures, 2);
        assert_eq!(counters.successes, 1);

        handle.stop().await;
    }

    #[test]
    fn test_overlap_policy_serde() {
        let policy: OverlapPolicy = serde_json::from_str(r#""allow""#).unwrap();
        assert_eq!(policy, OverlapPolicy::Allow);
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Skip);
    }
}
