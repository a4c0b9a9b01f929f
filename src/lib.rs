//! feed-relevance - per-user relevance indicators for an activity feed
//!
//! Attaches a tri-state "eye" indicator to every activity block of a portal's
//! activity stream, initializes it from a remote relevance service and writes each
//! click back to that service.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Models, errors and the ports onto the host page,
//!   the relevance service and failure reporting
//! - **Service Layer** (`services`): Feed scanning, mutation watching and indicator
//!   controllers, wired together by [`RelevanceEngine`]
//! - **Infrastructure Layer** (`infrastructure`): HTTP relevance client, in-memory
//!   feed host, configuration and logging
//! - **CLI Layer** (`cli`): Diagnostics against the relevance service
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feed_relevance::{HttpRelevanceClient, InMemoryFeed, RelevanceEngine, TracingFailureSink};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let feed = Arc::new(InMemoryFeed::new("http://localhost:8080"));
//!     let store = Arc::new(HttpRelevanceClient::new("http://localhost:8080/rest/datacollector")?);
//!     let engine = RelevanceEngine::new(feed, store, Arc::new(TracingFailureSink), Default::default());
//!     let handle = engine.start().await?;
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{HostError, RelevanceError};
pub use domain::models::{
    ActivityId, Config, FetchOutcome, IndicatorId, IndicatorState, LoggingConfig, MutationBatch,
    NodeId, RelevanceRecord, RemoteConfig, UserId, WatcherConfig,
};
pub use domain::ports::{FailureSink, FeedHost, RelevanceStore, SyncFailure};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::host::InMemoryFeed;
pub use infrastructure::logging::{RecordingFailureSink, TracingFailureSink};
pub use infrastructure::relevance::HttpRelevanceClient;
pub use services::{EngineHandle, FeedScanner, IndicatorRegistry, MutationWatcher, RelevanceEngine};
