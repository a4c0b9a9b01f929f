//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty console output
//! - Optional daily-rotated JSON log files
//! - Failure sinks for fire-and-forget paths

pub mod config;
pub mod failure_sink;
pub mod logger;

pub use config::LogFormat;
pub use failure_sink::{RecordingFailureSink, TracingFailureSink};
pub use logger::LoggerImpl;
