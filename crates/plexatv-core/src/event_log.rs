use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// Maximum number of events retained in the ring buffer.
const EVENT_LOG_CAPACITY: usize = 200;

/// A typed event from the poll pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    PollStarted,
    SessionsFetched { count: usize },
    SummaryPublished { session_count: usize },
    TickSkipped { reason: SkipReason },
    PollFailed { source: FailureSource, message: String },
}

/// Why a tick did not run a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous poll finished less than the minimum interval ago.
    Throttled,
    /// Another poll is still running.
    InFlight,
}

/// Which stage of the poll failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    Fetch,
    Summarize,
}

/// A timestamped event entry.
pub type EventEntry = (DateTime<Utc>, PollEvent);

/// Bounded ring buffer of poll events.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Push a new event, evicting the oldest if at capacity.
    pub fn push(&mut self, event: PollEvent) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back((Utc::now(), event));
    }

    /// Return a snapshot of all entries (newest last).
    pub fn snapshot(&self) -> Vec<EventEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe handle to the event log.
pub type SharedEventLog = Arc<Mutex<EventLog>>;

/// Create a new shared event log.
pub fn shared_event_log() -> SharedEventLog {
    Arc::new(Mutex::new(EventLog::new()))
}
