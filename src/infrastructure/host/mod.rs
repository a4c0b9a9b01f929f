//! Host page adapters.

pub mod memory;

pub use memory::{InMemoryFeed, NodeKind};
