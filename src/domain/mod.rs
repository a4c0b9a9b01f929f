//! Domain layer for the relevance engine
//!
//! This module contains the indicator model, relevance records and the ports
//! the engine is wired through.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{HostError, RelevanceError};
