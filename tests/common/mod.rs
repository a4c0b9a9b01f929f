//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use feed_relevance::{
    ActivityId, FetchOutcome, InMemoryFeed, RecordingFailureSink, RelevanceError,
    RelevanceRecord, RelevanceStore, UserId, WatcherConfig,
};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 10ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}

/// Feed with the signed-in user `u1`.
pub fn feed() -> Arc<InMemoryFeed> {
    Arc::new(InMemoryFeed::new("http://localhost:8080").with_user(UserId::new("u1")))
}

/// Watcher tuning with a short re-attach delay.
pub fn fast_watcher() -> WatcherConfig {
    WatcherConfig {
        reattach_delay_ms: 20,
        ..WatcherConfig::default()
    }
}

pub fn recording_sink() -> Arc<RecordingFailureSink> {
    Arc::new(RecordingFailureSink::new())
}

/// Scripted answer for one activity.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Found(bool),
    Missing,
    ServerError,
}

/// In-memory [`RelevanceStore`] with per-activity scripted reads.
///
/// Activities without a script read as missing. Every push is recorded once it has
/// been applied, so `pushes()` is in arrival order.
#[derive(Default)]
pub struct ScriptedStore {
    replies: Mutex<HashMap<String, Reply>>,
    pushes: Mutex<Vec<RelevanceRecord>>,
    fetches: AtomicUsize,
    fetch_delay: Duration,
    push_delays: (Duration, Duration),
    fail_pushes: bool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read sleeps for `delay` before answering.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Pushes of `true` sleep for `relevant`, pushes of `false` for `irrelevant`.
    pub fn with_push_delays(mut self, relevant: Duration, irrelevant: Duration) -> Self {
        self.push_delays = (relevant, irrelevant);
        self
    }

    /// Every push answers with HTTP 503.
    pub fn failing_pushes(mut self) -> Self {
        self.fail_pushes = true;
        self
    }

    pub fn reply(self, activity_id: &str, reply: Reply) -> Self {
        self.set_reply(activity_id, reply);
        self
    }

    pub fn set_reply(&self, activity_id: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(activity_id.to_string(), reply);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn pushes(&self) -> Vec<RelevanceRecord> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelevanceStore for ScriptedStore {
    async fn fetch_state(
        &self,
        _user_id: &UserId,
        activity_id: &ActivityId,
    ) -> Result<FetchOutcome, RelevanceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(activity_id.as_str())
            .copied()
            .unwrap_or(Reply::Missing);
        match reply {
            Reply::Found(relevant) => Ok(FetchOutcome::Found { relevant }),
            Reply::Missing => Ok(FetchOutcome::NotFound),
            Reply::ServerError => Err(RelevanceError::Status {
                status: 500,
                body: "internal error".to_string(),
            }),
        }
    }

    async fn push_state(
        &self,
        user_id: &UserId,
        activity_id: &ActivityId,
        relevant: bool,
    ) -> Result<(), RelevanceError> {
        let delay = if relevant {
            self.push_delays.0
        } else {
            self.push_delays.1
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.pushes.lock().unwrap().push(RelevanceRecord::new(
            user_id.clone(),
            activity_id.clone(),
            relevant,
        ));
        if self.fail_pushes {
            return Err(RelevanceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}
