//! Relevance records and the identifiers they are keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::indicator::IndicatorState;

/// Opaque identifier of the portal user, supplied by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of an activity in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract the identifier from an activity link target.
    ///
    /// The identifier is everything after the first `=`. Its format is not checked.
    /// Returns `None` when the target has no `=` or nothing follows it.
    pub fn from_link(target: &str) -> Option<Self> {
        let (_, id) = target.split_once('=')?;
        if id.is_empty() {
            return None;
        }
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote representation of one user's opinion on one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceRecord {
    pub user_id: UserId,
    pub activity_id: ActivityId,
    pub relevant: bool,
}

impl RelevanceRecord {
    pub fn new(user_id: UserId, activity_id: ActivityId, relevant: bool) -> Self {
        Self {
            user_id,
            activity_id,
            relevant,
        }
    }

    pub const fn state(&self) -> IndicatorState {
        IndicatorState::from_relevance(self.relevant)
    }
}

/// Result of reading a relevance record. A missing record is an expected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Found { relevant: bool },
    NotFound,
}

impl FetchOutcome {
    /// Indicator state this outcome resolves to.
    pub const fn state(self) -> IndicatorState {
        match self {
            Self::Found { relevant } => IndicatorState::from_relevance(relevant),
            Self::NotFound => IndicatorState::Unset,
        }
    }
}
