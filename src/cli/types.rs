//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use super::commands::relevance::{GetArgs, SetArgs};

#[derive(Parser, Debug)]
#[command(name = "feed-relevance")]
#[command(about = "Inspect and edit activity relevance records", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Relevance service base URL, overriding configuration
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the relevance record of one activity for one user
    Get(GetArgs),

    /// Write the relevance record of one activity for one user
    Set(SetArgs),

    /// Print the effective configuration
    Config,
}
