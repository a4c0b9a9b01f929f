pub mod client;

pub use client::{resolve_base_url, HttpRelevanceClient};
