//! Domain errors for the relevance engine.

use thiserror::Error;

use super::models::{IndicatorId, NodeId};

/// Errors raised while talking to the remote relevance service.
///
/// A missing record is not an error; it is reported as
/// [`FetchOutcome::NotFound`](super::models::FetchOutcome::NotFound).
#[derive(Debug, Error)]
pub enum RelevanceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Relevance service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed relevance response: {0}")]
    Decode(String),

    #[error("Invalid relevance service URL: {0}")]
    InvalidUrl(String),
}

impl RelevanceError {
    /// HTTP status carried by the error, if the server answered at all.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RelevanceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors raised by the host page adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Feed container is not present")]
    NoContainer,

    #[error("Element {0} is not attached to the feed")]
    NodeNotFound(NodeId),

    #[error("Element {0} is not a feed container")]
    NotAContainer(NodeId),

    #[error("Activity block {0} has no action bar")]
    MissingActionBar(NodeId),

    #[error("Indicator {0} no longer exists")]
    IndicatorNotFound(IndicatorId),
}
