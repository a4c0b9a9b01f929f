//! Infrastructure layer module
//!
//! This module contains the adapters behind the domain ports:
//! - Remote relevance service client (reqwest)
//! - In-memory feed host
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod host;
pub mod logging;
pub mod relevance;
