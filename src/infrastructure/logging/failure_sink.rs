//! Failure sinks for paths that never surface errors to the user.

use std::sync::{Mutex, PoisonError};

use tracing::{error, warn};

use crate::domain::ports::{FailureSink, SyncFailure};

/// Routes failures to the tracing infrastructure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, failure: SyncFailure) {
        match failure {
            SyncFailure::Fetch {
                user_id,
                activity_id,
                error,
            } => warn!(
                user_id = %user_id,
                activity_id = %activity_id,
                error = %error,
                "relevance fetch failed; block left without indicator"
            ),
            SyncFailure::Push {
                user_id,
                activity_id,
                relevant,
                error,
            } => warn!(
                user_id = %user_id,
                activity_id = %activity_id,
                relevant,
                error = %error,
                "relevance push failed; local indicator kept"
            ),
            SyncFailure::Host { operation, error } => error!(
                operation = %operation,
                error = %error,
                "host page operation failed"
            ),
        }
    }
}

/// Keeps every reported failure in memory, forwarding to an inner sink.
pub struct RecordingFailureSink<S = TracingFailureSink> {
    inner: S,
    failures: Mutex<Vec<SyncFailure>>,
}

impl RecordingFailureSink {
    pub fn new() -> Self {
        Self::wrapping(TracingFailureSink)
    }
}

impl Default for RecordingFailureSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FailureSink> RecordingFailureSink<S> {
    pub const fn wrapping(inner: S) -> Self {
        Self {
            inner,
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the failures reported so far.
    pub fn failures(&self) -> Vec<SyncFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: FailureSink> FailureSink for RecordingFailureSink<S> {
    fn report(&self, failure: SyncFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure.clone());
        self.inner.report(failure);
    }
}
