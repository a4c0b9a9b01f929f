//! Handles onto host feed elements and the structural changes reported for them.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Host-assigned handle of an element in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Host-assigned handle of an attached indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndicatorId(pub u64);

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indicator#{}", self.0)
    }
}

/// Identifies one observation session so log lines from an old and a new
/// watcher can be told apart while both are briefly alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One batch of structural changes observed under a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    /// Element whose children changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationBatch {
    pub fn inserted(target: NodeId, added: Vec<NodeId>) -> Self {
        Self {
            target,
            added,
            removed: Vec::new(),
        }
    }

    pub fn inserted_count(&self) -> usize {
        self.added.len()
    }

    /// Whether the batch looks like a new activity block rather than incidental churn.
    pub fn qualifies(&self, insert_threshold: usize) -> bool {
        self.inserted_count() > insert_threshold
    }
}
