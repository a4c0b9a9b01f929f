use serde::Serialize;

use crate::domain::models::{ActivityId, UserId};

/// A failure on a path that never surfaces to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncFailure {
    /// Initial state could not be read; the block was left without an indicator.
    Fetch {
        user_id: UserId,
        activity_id: ActivityId,
        error: String,
    },
    /// A fire-and-forget write failed; the indicator keeps the user's choice.
    Push {
        user_id: UserId,
        activity_id: ActivityId,
        relevant: bool,
        error: String,
    },
    /// The host page rejected a DOM operation.
    Host { operation: String, error: String },
}

/// Observability sink for [`SyncFailure`]s.
pub trait FailureSink: Send + Sync {
    fn report(&self, failure: SyncFailure);
}
