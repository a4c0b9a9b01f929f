//! feed-relevance CLI entry point.

use anyhow::Context;
use clap::Parser;

use feed_relevance::cli::{Cli, Commands};
use feed_relevance::infrastructure::config::ConfigLoader;
use feed_relevance::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match ConfigLoader::load().context("Failed to load configuration") {
        Ok(config) => config,
        Err(err) => feed_relevance::cli::handle_error(err, cli.json),
    };
    if let Some(base_url) = cli.base_url {
        config.remote.base_url = Some(base_url);
        if let Err(err) = ConfigLoader::validate(&config) {
            feed_relevance::cli::handle_error(err.into(), cli.json);
        }
    }

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => feed_relevance::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Get(args) => {
            feed_relevance::cli::commands::relevance::get(args, &config, cli.json).await
        }
        Commands::Set(args) => {
            feed_relevance::cli::commands::relevance::set(args, &config, cli.json).await
        }
        Commands::Config => feed_relevance::cli::commands::config::execute(&config, cli.json),
    };

    if let Err(err) = result {
        feed_relevance::cli::handle_error(err, cli.json);
    }
}
