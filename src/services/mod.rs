pub mod engine;
pub mod feed_scanner;
pub mod indicator_controller;
pub mod mutation_watcher;

pub use engine::{EngineHandle, RelevanceEngine};
pub use feed_scanner::{BlockOutcome, FeedScanner, ScanReport};
pub use indicator_controller::{IndicatorController, IndicatorRegistry, SyncContext};
pub use mutation_watcher::MutationWatcher;
