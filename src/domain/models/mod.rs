pub mod config;
pub mod feed;
pub mod indicator;
pub mod relevance;

pub use config::{Config, LoggingConfig, RemoteConfig, WatcherConfig};
pub use feed::{IndicatorId, MutationBatch, NodeId, SessionId};
pub use indicator::{IndicatorState, INDICATOR_CLASS};
pub use relevance::{ActivityId, FetchOutcome, RelevanceRecord, UserId};
