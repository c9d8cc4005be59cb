mod sensor;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use plexatv_api::{PlexClient, PlexError, SessionSource};
use plexatv_core::config::AppConfig;
use plexatv_core::error::CoreError;
use plexatv_core::event_log::{
    shared_event_log, EventEntry, FailureSource, PollEvent, SharedEventLog, SkipReason,
};
use plexatv_core::models::Summary;
use plexatv_core::summarizer;

pub use sensor::SessionSensor;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("connect failed: {0}")]
    Connect(#[from] PlexError),
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("summarize failed: {0}")]
    Summarize(#[from] CoreError),
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A poll ran and its summary is now published.
    Published(Summary),
    /// No poll ran.
    Skipped(SkipReason),
}

/// Polls a [`SessionSource`] and publishes the summarized result.
///
/// At most one poll runs at a time. A tick that arrives sooner than the
/// minimum interval after the last successful poll is skipped.
pub struct Runtime<S> {
    source: S,
    name: String,
    min_interval: Duration,
    summary: Arc<RwLock<Summary>>,
    /// Held for the duration of a poll; stores when the last one succeeded.
    last_success: Mutex<Option<Instant>>,
    event_log: SharedEventLog,
}

impl Runtime<PlexClient> {
    /// Connect to the configured Plex server.
    pub async fn connect(config: &AppConfig) -> Result<Self, RuntimeError> {
        let mode = config.server.auth_mode();
        info!(mode = mode.describe(), "Connecting to Plex");
        let client = PlexClient::connect(&mode).await?;
        Ok(Self::new(config, client))
    }
}

impl<S: SessionSource> Runtime<S> {
    pub fn new(config: &AppConfig, source: S) -> Self {
        Self {
            source,
            name: config.server.name.clone(),
            min_interval: config.poll_interval(),
            summary: Arc::new(RwLock::new(Summary::default())),
            last_success: Mutex::new(None),
            event_log: shared_event_log(),
        }
    }

    /// Snapshot of the published state.
    pub async fn sensor(&self) -> SessionSensor {
        SessionSensor::new(self.name.clone(), self.summary.read().await.clone())
    }

    pub fn events(&self) -> Vec<EventEntry> {
        self.event_log
            .lock()
            .map(|log| log.snapshot())
            .unwrap_or_default()
    }

    fn record(&self, event: PollEvent) {
        if let Ok(mut log) = self.event_log.lock() {
            log.push(event);
        }
    }

    fn skip(&self, reason: SkipReason) -> TickOutcome {
        debug!(?reason, "Skipping tick");
        self.record(PollEvent::TickSkipped { reason });
        TickOutcome::Skipped(reason)
    }

    /// Scheduled entry point: poll unless throttled or already polling.
    pub async fn run_poll_tick(&self) -> Result<TickOutcome, RuntimeError> {
        let Ok(mut last_success) = self.last_success.try_lock() else {
            return Ok(self.skip(SkipReason::InFlight));
        };

        if let Some(at) = *last_success {
            if at.elapsed() < self.min_interval {
                return Ok(self.skip(SkipReason::Throttled));
            }
        }

        let summary = self.poll().await?;
        *last_success = Some(Instant::now());
        Ok(TickOutcome::Published(summary))
    }

    /// Poll right away, ignoring the minimum interval.
    pub async fn force_poll(&self) -> Result<TickOutcome, RuntimeError> {
        let Ok(mut last_success) = self.last_success.try_lock() else {
            return Ok(self.skip(SkipReason::InFlight));
        };
        let summary = self.poll().await?;
        *last_success = Some(Instant::now());
        Ok(TickOutcome::Published(summary))
    }

    /// Fetch, summarize, publish. On failure the previous summary stays.
    async fn poll(&self) -> Result<Summary, RuntimeError> {
        self.record(PollEvent::PollStarted);

        let sessions = match self.source.fetch_sessions().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Fetching sessions failed");
                self.record(PollEvent::PollFailed {
                    source: FailureSource::Fetch,
                    message: e.to_string(),
                });
                return Err(RuntimeError::Fetch(Box::new(e)));
            }
        };
        self.record(PollEvent::SessionsFetched {
            count: sessions.len(),
        });

        let summary = match summarizer::summarize(&sessions) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Malformed session data");
                self.record(PollEvent::PollFailed {
                    source: FailureSource::Summarize,
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        *self.summary.write().await = summary.clone();
        info!(sessions = summary.session_count, "Published summary");
        self.record(PollEvent::SummaryPublished {
            session_count: summary.session_count,
        });
        Ok(summary)
    }

    /// Tick every `every` until the future is dropped. Each tick's result is
    /// handed to `on_tick`; errors never stop the loop.
    pub async fn run<F>(&self, every: Duration, mut on_tick: F)
    where
        F: FnMut(&Result<TickOutcome, RuntimeError>),
    {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let result = self.run_poll_tick().await;
            on_tick(&result);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use plexatv_core::models::{RawSession, SessionKind};

    #[derive(Debug, thiserror::Error)]
    #[error("server unreachable")]
    struct Unreachable;

    /// Replays scripted fetch results; an exhausted script returns no sessions.
    #[derive(Default)]
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<Result<Vec<RawSession>, Unreachable>>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<RawSession>, Unreachable>>) -> Self {
            Self {
                script: std::sync::Mutex::new(script.into()),
                ..Default::default()
            }
        }
    }

    impl SessionSource for ScriptedSource {
        type Error = Unreachable;

        async fn fetch_sessions(&self) -> Result<Vec<RawSession>, Unreachable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn movie(title: &str) -> RawSession {
        RawSession::new(SessionKind::Movie, title, "bob")
    }

    fn runtime(source: ScriptedSource) -> Runtime<ScriptedSource> {
        Runtime::new(&AppConfig::default(), source)
    }

    #[tokio::test]
    async fn test_publishes_summary() {
        let rt = runtime(ScriptedSource::new(vec![Ok(vec![movie("Dune"), movie("Alien")])]));

        let outcome = rt.run_poll_tick().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published(ref s) if s.session_count == 2));

        let sensor = rt.sensor().await;
        assert_eq!(sensor.name(), "PlexATV");
        assert_eq!(sensor.state(), 2);
        assert_eq!(sensor.attributes()["session_2"], "bob - Alien");
    }

    #[tokio::test]
    async fn test_initial_state_is_empty() {
        let rt = runtime(ScriptedSource::default());
        let sensor = rt.sensor().await;
        assert_eq!(sensor.state(), 0);
        assert!(sensor.attributes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttles_within_interval() {
        let rt = runtime(ScriptedSource::default());

        rt.run_poll_tick().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let outcome = rt.run_poll_tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::Throttled));
        assert_eq!(rt.source.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let outcome = rt.run_poll_tick().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published(_)));
        assert_eq!(rt.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_poll_ignores_interval() {
        let rt = runtime(ScriptedSource::default());
        rt.run_poll_tick().await.unwrap();
        let outcome = rt.force_poll().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published(_)));
        assert_eq!(rt.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_state() {
        let rt = runtime(ScriptedSource::new(vec![
            Ok(vec![movie("Dune")]),
            Err(Unreachable),
        ]));

        rt.force_poll().await.unwrap();
        let err = rt.force_poll().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Fetch(_)));

        let sensor = rt.sensor().await;
        assert_eq!(sensor.state(), 1);
        assert_eq!(sensor.attributes()["session_1"], "bob - Dune");
    }

    #[tokio::test]
    async fn test_malformed_session_keeps_previous_state() {
        let mut anonymous = movie("Alien");
        anonymous.usernames.clear();
        let rt = runtime(ScriptedSource::new(vec![
            Ok(vec![movie("Dune")]),
            Ok(vec![movie("Heat"), anonymous]),
        ]));

        rt.force_poll().await.unwrap();
        let err = rt.force_poll().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Summarize(CoreError::MissingField { position: 2, .. })
        ));

        let sensor = rt.sensor().await;
        assert_eq!(sensor.state(), 1);
        assert_eq!(sensor.attributes()["session_1"], "bob - Dune");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_does_not_throttle_retry() {
        let rt = runtime(ScriptedSource::new(vec![Err(Unreachable), Ok(vec![movie("Dune")])]));

        assert!(rt.run_poll_tick().await.is_err());
        let outcome = rt.run_poll_tick().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published(ref s) if s.session_count == 1));
    }

    #[tokio::test]
    async fn test_skips_tick_while_polling() {
        let gate = Arc::new(Notify::new());
        let source = ScriptedSource {
            gate: Some(gate.clone()),
            ..ScriptedSource::new(vec![Ok(vec![movie("Dune")])])
        };
        let rt = Arc::new(runtime(source));

        let first = {
            let rt = rt.clone();
            tokio::spawn(async move { rt.run_poll_tick().await })
        };
        while rt.source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let outcome = rt.run_poll_tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::InFlight));

        gate.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, TickOutcome::Published(_)));
        assert_eq!(rt.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_records_events() {
        let rt = runtime(ScriptedSource::new(vec![Ok(vec![movie("Dune")]), Err(Unreachable)]));
        rt.force_poll().await.unwrap();
        let _ = rt.force_poll().await;

        let events: Vec<PollEvent> = rt.events().into_iter().map(|(_, e)| e).collect();
        assert_eq!(
            events,
            vec![
                PollEvent::PollStarted,
                PollEvent::SessionsFetched { count: 1 },
                PollEvent::SummaryPublished { session_count: 1 },
                PollEvent::PollStarted,
                PollEvent::PollFailed {
                    source: FailureSource::Fetch,
                    message: "server unreachable".into(),
                },
            ]
        );
    }
}
