//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the engine is wired through:
//! - FeedHost: the page that renders the activity feed
//! - RelevanceStore: the remote relevance service
//! - FailureSink: where unsurfaced failures are reported

pub mod failure_sink;
pub mod feed_host;
pub mod relevance_store;

pub use failure_sink::{FailureSink, SyncFailure};
pub use feed_host::FeedHost;
pub use relevance_store::RelevanceStore;
